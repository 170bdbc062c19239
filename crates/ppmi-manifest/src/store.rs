//! Manifest persistence discipline.
//!
//! The manifest on disk is the one durable artifact of a dataset; runs
//! may add rows but never silently lose a previously-seen
//! (participant, session) pair, regenerate mode included. A lost pair
//! means the inventory shrank or the manifest was hand-edited, and
//! either needs a human first.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Result};
use polars::prelude::DataFrame;
use tracing::info;

use ppmi_ingest::{column_values, read_string_frame, require_columns, string_frame};
use ppmi_model::columns::{
    COL_DATATYPE, COL_NEUROMELANIN, COL_PARTICIPANT_ID, COL_SESSION_ID, COL_VISIT_ID,
};
use ppmi_model::visits::visit_order_key;
use ppmi_model::CurationError;

/// Manifest column order.
pub const COLS_MANIFEST: [&str; 5] = [
    COL_PARTICIPANT_ID,
    COL_VISIT_ID,
    COL_SESSION_ID,
    COL_DATATYPE,
    COL_NEUROMELANIN,
];

/// Loads an existing manifest, validating its column set.
pub fn load_manifest(path: &Path) -> Result<DataFrame> {
    let df = read_string_frame(path)?;
    require_columns(&df, path, &COLS_MANIFEST)?;
    Ok(df)
}

/// Reconciles a freshly built manifest against the previous one.
///
/// Without `regenerate`, only rows for new (participant, session)
/// pairs are appended to the old manifest. With `regenerate`, existing
/// rows are recomputed from scratch, but losing a previously-present
/// pair is still an error.
pub fn reconcile_manifest(
    new: &DataFrame,
    old: Option<&DataFrame>,
    regenerate: bool,
) -> Result<DataFrame> {
    let Some(old) = old else {
        return sort_manifest(new);
    };

    let new_pairs: BTreeSet<(String, String)> = manifest_pairs(new)?.into_iter().collect();
    let old_pairs = manifest_pairs(old)?;
    let lost = old_pairs
        .iter()
        .filter(|pair| !new_pairs.contains(pair))
        .count();
    if lost > 0 {
        bail!(CurationError::ManifestRowsLost { count: lost });
    }

    if regenerate {
        return sort_manifest(new);
    }

    let old_pairs: BTreeSet<(String, String)> = old_pairs.into_iter().collect();
    let pairs = manifest_pairs(new)?;
    let mut combined = frame_rows(old)?;
    let new_rows = frame_rows(new)?;
    let mut appended = 0usize;
    for (row, pair) in new_rows.into_iter().zip(pairs) {
        if !old_pairs.contains(&pair) {
            combined.push(row);
            appended += 1;
        }
    }
    info!(appended, "added rows to existing manifest");
    sort_manifest(&rows_to_manifest(combined)?)
}

fn manifest_pairs(df: &DataFrame) -> Result<Vec<(String, String)>> {
    let participants = column_values(df, COL_PARTICIPANT_ID)?;
    let sessions = column_values(df, COL_SESSION_ID)?;
    Ok(participants.into_iter().zip(sessions).collect())
}

fn frame_rows(df: &DataFrame) -> Result<Vec<Vec<String>>> {
    let columns: Vec<Vec<String>> = COLS_MANIFEST
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<_>>()?;
    let mut rows = vec![Vec::with_capacity(COLS_MANIFEST.len()); df.height()];
    for column in &columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value.clone());
        }
    }
    Ok(rows)
}

fn rows_to_manifest(rows: Vec<Vec<String>>) -> Result<DataFrame> {
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); COLS_MANIFEST.len()];
    for row in &rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value.clone());
        }
    }
    string_frame(COLS_MANIFEST.iter().copied().zip(columns).collect())
}

/// Deduplicates exact rows and sorts by participant then visit order.
fn sort_manifest(df: &DataFrame) -> Result<DataFrame> {
    let mut rows = frame_rows(df)?;
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    rows.retain(|row| seen.insert(row.clone()));

    let numeric_subjects = !rows.is_empty()
        && rows
            .iter()
            .all(|row| row[0].parse::<i64>().is_ok());
    rows.sort_by(|a, b| {
        let subject_order = if numeric_subjects {
            let left = a[0].parse::<i64>().unwrap_or(i64::MAX);
            let right = b[0].parse::<i64>().unwrap_or(i64::MAX);
            left.cmp(&right)
        } else {
            a[0].cmp(&b[0])
        };
        subject_order.then_with(|| visit_order_key(&a[1]).cmp(&visit_order_key(&b[1])))
    });
    rows_to_manifest(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppmi_ingest::cell;

    fn manifest(rows: Vec<[&str; 5]>) -> DataFrame {
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); 5];
        for row in rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value.to_string());
            }
        }
        string_frame(COLS_MANIFEST.iter().copied().zip(columns).collect()).unwrap()
    }

    #[test]
    fn first_run_sorts_by_subject_then_visit_order() {
        let new = manifest(vec![
            ["3001", "BL", "BL", "[]", "False"],
            ["3000", "V04", "V04", r#"["anat"]"#, "False"],
            ["3000", "SC", "SC", "[]", "False"],
        ]);
        let out = reconcile_manifest(&new, None, false).unwrap();
        assert_eq!(cell(&out, COL_PARTICIPANT_ID, 0).unwrap(), "3000");
        assert_eq!(cell(&out, COL_VISIT_ID, 0).unwrap(), "SC");
        assert_eq!(cell(&out, COL_VISIT_ID, 1).unwrap(), "V04");
        assert_eq!(cell(&out, COL_PARTICIPANT_ID, 2).unwrap(), "3001");
    }

    #[test]
    fn append_only_run_keeps_old_rows_untouched() {
        let old = manifest(vec![["3000", "BL", "BL", r#"["anat"]"#, "False"]]);
        let new = manifest(vec![
            // recomputed cell differs; the old row must win
            ["3000", "BL", "BL", r#"["anat","dwi"]"#, "False"],
            ["3000", "V04", "V04", "[]", "False"],
        ]);
        let out = reconcile_manifest(&new, Some(&old), false).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(cell(&out, COL_DATATYPE, 0).unwrap(), r#"["anat"]"#);
        assert_eq!(cell(&out, COL_VISIT_ID, 1).unwrap(), "V04");
    }

    #[test]
    fn regenerate_recomputes_existing_rows() {
        let old = manifest(vec![["3000", "BL", "BL", r#"["anat"]"#, "False"]]);
        let new = manifest(vec![["3000", "BL", "BL", r#"["anat","dwi"]"#, "True"]]);
        let out = reconcile_manifest(&new, Some(&old), true).unwrap();
        assert_eq!(cell(&out, COL_DATATYPE, 0).unwrap(), r#"["anat","dwi"]"#);
    }

    #[test]
    fn losing_a_pair_is_an_error_even_when_regenerating() {
        let old = manifest(vec![
            ["3000", "BL", "BL", "[]", "False"],
            ["3001", "BL", "BL", "[]", "False"],
        ]);
        let new = manifest(vec![["3000", "BL", "BL", "[]", "False"]]);
        for regenerate in [false, true] {
            let err = reconcile_manifest(&new, Some(&old), regenerate).unwrap_err();
            assert!(err.to_string().contains("missing"));
        }
    }

    #[test]
    fn load_rejects_a_frame_without_manifest_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        std::fs::write(&path, "participant_id,visit_id\n3000,BL\n").unwrap();
        assert!(load_manifest(&path).is_err());
    }
}
