use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use ppmi_model::{AdvisoryKind, AdvisoryLog};

use crate::types::{BagelOutcome, FilterOutcome, HeuristicOutcome, ManifestOutcome};

const ADVISORY_KINDS: [AdvisoryKind; 7] = [
    AdvisoryKind::SuspiciousDescription,
    AdvisoryKind::CrossModalityDuplicate,
    AdvisoryKind::MergeResidue,
    AdvisoryKind::DroppedRow,
    AdvisoryKind::CohortResolution,
    AdvisoryKind::SourceShape,
    AdvisoryKind::HeuristicSkip,
];

pub fn print_filter_summary(outcome: &FilterOutcome) {
    println!("Description map: {}", outcome.map_path.display());
    println!("Ignored list: {}", outcome.ignored_path.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Datatype"),
        header_cell("Descriptions"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![datatype_cell("anat"), Cell::new(outcome.anat_count)]);
    table.add_row(vec![datatype_cell("dwi"), Cell::new(outcome.dwi_count)]);
    table.add_row(vec![datatype_cell("func"), Cell::new(outcome.func_count)]);
    table.add_row(vec![
        Cell::new("ignored").fg(Color::DarkGrey),
        count_cell(outcome.ignored_count, Color::Yellow),
    ]);
    println!("{table}");
    print_advisory_table(&outcome.advisories);
    if !outcome.wrote {
        println!("Dry run: no files written.");
    }
}

pub fn print_manifest_summary(outcome: &ManifestOutcome) {
    println!("Manifest: {}", outcome.manifest_path.display());
    println!("Rows: {}", outcome.rows);
    print_advisory_table(&outcome.advisories);
    if !outcome.wrote {
        println!("Dry run: no files written.");
    }
}

pub fn print_bagel_summary(outcome: &BagelOutcome) {
    println!(
        "Bagel: {} ({} rows)",
        outcome.bagel_path.display(),
        outcome.bagel_rows
    );
    println!(
        "Dashboard: {} ({} rows)",
        outcome.dashboard_path.display(),
        outcome.dashboard_rows
    );
    print_advisory_table(&outcome.advisories);
    if !(outcome.wrote_bagel && outcome.wrote_dashboard) {
        println!("Dry run: no files written.");
    }
}

pub fn print_heuristic_summary(outcome: &HeuristicOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Listing"),
        header_cell("Series"),
        header_cell("Templates"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for report in &outcome.reports {
        let templates = if report.templates.is_empty() {
            "-".to_string()
        } else {
            report
                .templates
                .iter()
                .map(|(template, count)| format!("{template} x{count}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        table.add_row(vec![
            Cell::new(&report.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(report.series_count),
            Cell::new(templates),
            match &report.error {
                Some(message) => Cell::new(message).fg(Color::Red),
                None => dim_cell("-"),
            },
        ]);
    }
    println!("{table}");
    print_advisory_table(&outcome.advisories);
}

fn print_advisory_table(advisories: &AdvisoryLog) {
    if advisories.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Advisory"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for kind in ADVISORY_KINDS {
        let count = advisories.count_of(kind);
        if count == 0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(kind.to_string()).fg(Color::Yellow),
            count_cell(count, Color::Yellow),
        ]);
    }
    println!();
    println!("Advisories ({} total):", advisories.len());
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() >= 4 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Percentage(45)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn datatype_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
