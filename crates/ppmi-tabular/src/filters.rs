//! Duplicate-resolution filters applied to raw study-data files.
//!
//! PPMI study CSVs carry repeated measurements that would explode a
//! subject-visit join. Each filter reduces one known-duplicated column
//! to the (subject, visit) or (subject) grain before merging.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::info;

use ppmi_ingest::{format_numeric, parse_f64, parse_i64};
use ppmi_model::columns::{COL_SUBJECT_TABULAR, COL_VISIT_TABULAR};
use ppmi_model::visits::visit_order_key;

use crate::table::RowTable;

pub const COL_UPDRS3: &str = "NP3TOT";
pub const COL_UPDRS3_OFF: &str = "NP3TOT_OFF";
pub const COL_UPDRS3_ON: &str = "NP3TOT_ON";
pub const COL_AGE: &str = "AGE_AT_VISIT";
pub const COL_EDUCATION: &str = "EDUCYRS";
pub const COL_UPSIT: &str = "UPSIT_PRCNTGE";

/// Applies every filter whose target column is present, in a fixed
/// order. This is the hook handed to the tabular source loader.
pub fn apply_loading_filters(df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    let has = |column: &str| names.iter().any(|name| name == column);

    let mut df = df;
    if has(COL_UPDRS3) {
        info!("filtering {COL_UPDRS3}");
        df = updrs3_on_off_splitter(&df)?;
    }
    if has(COL_AGE) {
        info!("filtering {COL_AGE}");
        df = age_filter(&df)?;
    }
    if has(COL_EDUCATION) {
        info!("filtering {COL_EDUCATION}");
        df = education_filter(&df)?;
    }
    if has(COL_UPSIT) {
        info!("filtering {COL_UPSIT}");
        df = upsit_filter(&df)?;
    }
    Ok(df)
}

/// Splits UPDRS part III totals into ON and OFF medication columns.
///
/// Every measurement lands in exactly one bucket; the default is OFF.
/// Duplicate measurements in a bucket keep the maximum.
pub fn updrs3_on_off_splitter(df: &DataFrame) -> Result<DataFrame> {
    let table = RowTable::from_frame(df)?;
    let idx_subject = table.idx(COL_SUBJECT_TABULAR)?;
    let idx_visit = table.idx(COL_VISIT_TABULAR)?;
    let idx_state = table.idx("PDSTATE")?;
    let idx_page = table.idx("PAG_NAME")?;
    let idx_treatment = table.idx("PDTRTMNT")?;
    let idx_score = table.idx(COL_UPDRS3)?;

    // (subject, visit) -> (off, on)
    let mut buckets: BTreeMap<(String, String), (Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in &table.rows {
        let state = row[idx_state].as_str();
        let page = row[idx_page].as_str();
        let treatment = row[idx_treatment].as_str();

        let mut is_on = false;
        if state == "ON" {
            is_on = true;
        } else if treatment != "0" && state != "OFF" {
            if page == "NUPDR3ON" {
                is_on = true;
            } else if page != "NUPDR3OF" && treatment == "1" {
                is_on = true;
            }
        }

        let entry = buckets
            .entry((row[idx_subject].clone(), row[idx_visit].clone()))
            .or_insert((None, None));
        let slot = if is_on { &mut entry.1 } else { &mut entry.0 };
        if let Some(score) = parse_f64(&row[idx_score]) {
            *slot = Some(match *slot {
                Some(existing) => existing.max(score),
                None => score,
            });
        }
    }

    let format_slot =
        |slot: Option<f64>| slot.map(format_numeric).unwrap_or_default();
    let out = RowTable {
        headers: vec![
            COL_SUBJECT_TABULAR.to_string(),
            COL_VISIT_TABULAR.to_string(),
            COL_UPDRS3_OFF.to_string(),
            COL_UPDRS3_ON.to_string(),
        ],
        rows: buckets
            .into_iter()
            .map(|((subject, visit), (off, on))| {
                vec![subject, visit, format_slot(off), format_slot(on)]
            })
            .collect(),
    };
    out.to_frame()
}

/// Resolves subjects with multiple age entries at the same visit.
///
/// A duplicated age is discarded when it is at least as large as a
/// non-duplicated age recorded at a later-or-equal visit (it cannot be
/// right); the survivors are averaged.
pub fn age_filter(df: &DataFrame) -> Result<DataFrame> {
    let table = RowTable::from_frame(df)?;
    let idx_subject = table.idx(COL_SUBJECT_TABULAR)?;
    let idx_visit = table.idx(COL_VISIT_TABULAR)?;
    let idx_age = table.idx(COL_AGE)?;

    // count parsed ages per (subject, visit)
    let mut age_counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in &table.rows {
        if parse_f64(&row[idx_age]).is_some() {
            *age_counts
                .entry((row[idx_subject].clone(), row[idx_visit].clone()))
                .or_default() += 1;
        }
    }
    let duplicated: BTreeSet<(String, String)> = age_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();

    let mut out = RowTable {
        headers: table.headers.clone(),
        rows: table
            .rows
            .iter()
            .filter(|row| {
                !duplicated
                    .contains(&(row[idx_subject].clone(), row[idx_visit].clone()))
            })
            .cloned()
            .collect(),
    };

    for (subject, visit) in &duplicated {
        let duplicate_ages: Vec<f64> = table
            .rows
            .iter()
            .filter(|row| &row[idx_subject] == subject && &row[idx_visit] == visit)
            .filter_map(|row| parse_f64(&row[idx_age]))
            .collect();
        let other_rows: Vec<(&String, f64)> = table
            .rows
            .iter()
            .filter(|row| &row[idx_subject] == subject && &row[idx_visit] != visit)
            .filter_map(|row| parse_f64(&row[idx_age]).map(|age| (&row[idx_visit], age)))
            .collect();

        let survivors: Vec<f64> = duplicate_ages
            .iter()
            .copied()
            .filter(|age| {
                !other_rows.iter().any(|(other_visit, other_age)| {
                    visit_order_key(visit) <= visit_order_key(other_visit)
                        && *age >= *other_age
                })
            })
            .collect();
        let resolved = if survivors.is_empty() {
            String::new()
        } else {
            format_numeric(survivors.iter().sum::<f64>() / survivors.len() as f64)
        };
        out.rows.push(out.blank_row(&[
            (idx_subject, subject.clone()),
            (idx_visit, visit.clone()),
            (idx_age, resolved),
        ]));
    }

    sort_rows(&mut out, &[idx_subject, idx_visit]);
    out.to_frame()
}

/// Collapses education years to one value per subject.
///
/// Exact repeats are dropped; a subject with several distinct values
/// gets their mean.
pub fn education_filter(df: &DataFrame) -> Result<DataFrame> {
    let table = RowTable::from_frame(df)?;
    let idx_subject = table.idx(COL_SUBJECT_TABULAR)?;
    let idx_value = table.idx(COL_EDUCATION)?;

    // drop unparseable rows and exact (subject, value) repeats
    let mut seen: BTreeSet<(String, u64)> = BTreeSet::new();
    let mut kept: Vec<&Vec<String>> = Vec::new();
    for row in &table.rows {
        let Some(value) = parse_f64(&row[idx_value]) else {
            continue;
        };
        if seen.insert((row[idx_subject].clone(), value.to_bits())) {
            kept.push(row);
        }
    }

    let mut value_counts: BTreeMap<&String, usize> = BTreeMap::new();
    for row in &kept {
        *value_counts.entry(&row[idx_subject]).or_default() += 1;
    }
    let multi: BTreeSet<String> = value_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(subject, _)| subject.clone())
        .collect();

    let mut out = RowTable {
        headers: table.headers.clone(),
        rows: kept
            .iter()
            .filter(|row| !multi.contains(&row[idx_subject]))
            .map(|row| (*row).clone())
            .collect(),
    };
    for subject in &multi {
        let values: Vec<f64> = kept
            .iter()
            .filter(|row| &row[idx_subject] == subject)
            .filter_map(|row| parse_f64(&row[idx_value]))
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        out.rows.push(out.blank_row(&[
            (idx_subject, subject.clone()),
            (idx_value, format_numeric(mean)),
        ]));
    }

    sort_rows(&mut out, &[idx_subject]);
    out.to_frame()
}

/// Averages repeated UPSIT scores at the same (subject, visit).
pub fn upsit_filter(df: &DataFrame) -> Result<DataFrame> {
    let table = RowTable::from_frame(df)?;
    let idx_subject = table.idx(COL_SUBJECT_TABULAR)?;
    let idx_visit = table.idx(COL_VISIT_TABULAR)?;
    let idx_value = table.idx(COL_UPSIT)?;

    let kept: Vec<&Vec<String>> = table
        .rows
        .iter()
        .filter(|row| parse_f64(&row[idx_value]).is_some())
        .collect();

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in &kept {
        *counts
            .entry((row[idx_subject].clone(), row[idx_visit].clone()))
            .or_default() += 1;
    }
    let multi: BTreeSet<(String, String)> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();

    let mut out = RowTable {
        headers: table.headers.clone(),
        rows: kept
            .iter()
            .filter(|row| {
                !multi.contains(&(row[idx_subject].clone(), row[idx_visit].clone()))
            })
            .map(|row| (*row).clone())
            .collect(),
    };
    for (subject, visit) in &multi {
        let values: Vec<f64> = kept
            .iter()
            .filter(|row| &row[idx_subject] == subject && &row[idx_visit] == visit)
            .filter_map(|row| parse_f64(&row[idx_value]))
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        out.rows.push(out.blank_row(&[
            (idx_subject, subject.clone()),
            (idx_visit, visit.clone()),
            (idx_value, format_numeric(mean)),
        ]));
    }

    sort_rows(&mut out, &[idx_subject, idx_visit]);
    out.to_frame()
}

/// Sorts rows by the given columns, numerically when every value in a
/// column parses as an integer and lexicographically otherwise.
fn sort_rows(table: &mut RowTable, columns: &[usize]) {
    let numeric: Vec<bool> = columns
        .iter()
        .map(|idx| {
            !table.rows.is_empty()
                && table.rows.iter().all(|row| parse_i64(&row[*idx]).is_some())
        })
        .collect();
    table.rows.sort_by(|a, b| {
        for (idx, is_numeric) in columns.iter().zip(&numeric) {
            let ordering = if *is_numeric {
                let left = parse_i64(&a[*idx]).unwrap_or(i64::MAX);
                let right = parse_i64(&b[*idx]).unwrap_or(i64::MAX);
                left.cmp(&right)
            } else {
                a[*idx].cmp(&b[*idx])
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppmi_ingest::{cell, column_values, string_frame};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn updrs3_splits_on_and_off_and_keeps_the_maximum() {
        let df = string_frame(vec![
            (
                COL_SUBJECT_TABULAR,
                strings(&["3000", "3000", "3000", "3001"]),
            ),
            (COL_VISIT_TABULAR, strings(&["V04", "V04", "V04", "BL"])),
            (
                "PDSTATE",
                strings(&["ON", "", "OFF", ""]),
            ),
            (
                "PAG_NAME",
                strings(&["NUPDR3ON", "NUPDR3ON", "NUPDR3OF", "NUPDRS3"]),
            ),
            ("PDTRTMNT", strings(&["1", "1", "1", "0"])),
            (COL_UPDRS3, strings(&["10", "12", "20", "7"])),
        ])
        .unwrap();

        let out = updrs3_on_off_splitter(&df).unwrap();
        assert_eq!(out.height(), 2);
        // lexicographic on (subject, visit): 3000/V04 then 3001/BL
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 0).unwrap(), "3000");
        assert_eq!(cell(&out, COL_UPDRS3_OFF, 0).unwrap(), "20");
        assert_eq!(cell(&out, COL_UPDRS3_ON, 0).unwrap(), "12");
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 1).unwrap(), "3001");
        assert_eq!(cell(&out, COL_UPDRS3_OFF, 1).unwrap(), "7");
        assert_eq!(cell(&out, COL_UPDRS3_ON, 1).unwrap(), "");
    }

    #[test]
    fn updrs3_untreated_rows_default_to_off() {
        let df = string_frame(vec![
            (COL_SUBJECT_TABULAR, strings(&["3002"])),
            (COL_VISIT_TABULAR, strings(&["BL"])),
            ("PDSTATE", strings(&[""])),
            ("PAG_NAME", strings(&["NUPDRS3"])),
            ("PDTRTMNT", strings(&["0"])),
            (COL_UPDRS3, strings(&["33"])),
        ])
        .unwrap();

        let out = updrs3_on_off_splitter(&df).unwrap();
        assert_eq!(cell(&out, COL_UPDRS3_OFF, 0).unwrap(), "33");
        assert_eq!(cell(&out, COL_UPDRS3_ON, 0).unwrap(), "");
    }

    #[test]
    fn age_filter_discards_duplicates_older_than_later_visits() {
        // Subject 3000 has two ages at BL; 75.0 is at least as large as
        // the V04 age so it cannot be right, 72.0 survives.
        let df = string_frame(vec![
            (
                COL_SUBJECT_TABULAR,
                strings(&["3000", "3000", "3000", "3001"]),
            ),
            (COL_VISIT_TABULAR, strings(&["BL", "BL", "V04", "BL"])),
            (COL_AGE, strings(&["72.0", "75.0", "73.0", "61.5"])),
        ])
        .unwrap();

        let out = age_filter(&df).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 0).unwrap(), "3000");
        assert_eq!(cell(&out, COL_VISIT_TABULAR, 0).unwrap(), "BL");
        assert_eq!(cell(&out, COL_AGE, 0).unwrap(), "72");
        assert_eq!(cell(&out, COL_VISIT_TABULAR, 1).unwrap(), "V04");
        assert_eq!(cell(&out, COL_AGE, 1).unwrap(), "73.0");
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 2).unwrap(), "3001");
    }

    #[test]
    fn age_filter_averages_surviving_duplicates() {
        let df = string_frame(vec![
            (COL_SUBJECT_TABULAR, strings(&["3000", "3000", "3000"])),
            (COL_VISIT_TABULAR, strings(&["V04", "V04", "BL"])),
            (COL_AGE, strings(&["74.0", "74.5", "73.0"])),
        ])
        .unwrap();

        // BL is earlier than V04 so nothing is discarded
        let out = age_filter(&df).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(cell(&out, COL_VISIT_TABULAR, 0).unwrap(), "BL");
        assert_eq!(cell(&out, COL_VISIT_TABULAR, 1).unwrap(), "V04");
        assert_eq!(cell(&out, COL_AGE, 1).unwrap(), "74.25");
    }

    #[test]
    fn education_filter_drops_repeats_and_averages_conflicts() {
        let df = string_frame(vec![
            (
                COL_SUBJECT_TABULAR,
                strings(&["3000", "3000", "3001", "3001", "3002"]),
            ),
            (
                COL_EDUCATION,
                strings(&["16", "16", "12", "14", "bad"]),
            ),
        ])
        .unwrap();

        let out = education_filter(&df).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 0).unwrap(), "3000");
        assert_eq!(cell(&out, COL_EDUCATION, 0).unwrap(), "16");
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 1).unwrap(), "3001");
        assert_eq!(cell(&out, COL_EDUCATION, 1).unwrap(), "13");
    }

    #[test]
    fn upsit_filter_averages_repeated_scores() {
        let df = string_frame(vec![
            (
                COL_SUBJECT_TABULAR,
                strings(&["3000", "3000", "3001", "3002"]),
            ),
            (COL_VISIT_TABULAR, strings(&["BL", "BL", "BL", "V04"])),
            (COL_UPSIT, strings(&["40", "60", "85", ""])),
        ])
        .unwrap();

        let out = upsit_filter(&df).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 0).unwrap(), "3000");
        assert_eq!(cell(&out, COL_UPSIT, 0).unwrap(), "50");
        assert_eq!(cell(&out, COL_SUBJECT_TABULAR, 1).unwrap(), "3001");
        assert_eq!(cell(&out, COL_UPSIT, 1).unwrap(), "85");
    }

    #[test]
    fn sorting_is_numeric_only_when_every_value_parses() {
        let df = string_frame(vec![
            (COL_SUBJECT_TABULAR, strings(&["10000", "3000", "9000"])),
            (COL_VISIT_TABULAR, strings(&["BL", "BL", "BL"])),
            (COL_UPSIT, strings(&["1", "2", "3"])),
        ])
        .unwrap();
        let out = upsit_filter(&df).unwrap();
        assert_eq!(
            column_values(&out, COL_SUBJECT_TABULAR).unwrap(),
            strings(&["3000", "9000", "10000"])
        );

        let df = string_frame(vec![
            (COL_SUBJECT_TABULAR, strings(&["10000", "PD3000"])),
            (COL_VISIT_TABULAR, strings(&["BL", "BL"])),
            (COL_UPSIT, strings(&["1", "2"])),
        ])
        .unwrap();
        let out = upsit_filter(&df).unwrap();
        assert_eq!(
            column_values(&out, COL_SUBJECT_TABULAR).unwrap(),
            strings(&["10000", "PD3000"])
        );
    }

    #[test]
    fn loading_filters_skip_frames_without_target_columns() {
        let df = string_frame(vec![
            (COL_SUBJECT_TABULAR, strings(&["3000"])),
            (COL_VISIT_TABULAR, strings(&["BL"])),
            ("MOCA", strings(&["27"])),
        ])
        .unwrap();
        let out = apply_loading_filters(df.clone()).unwrap();
        assert_eq!(out, df);
    }
}
