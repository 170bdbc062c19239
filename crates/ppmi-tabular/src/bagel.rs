//! Bagel assembly: one wide row per participant-visit, plus the long
//! dashboard form.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Result};
use polars::prelude::DataFrame;
use tracing::{info, warn};

use ppmi_ingest::{column_values, string_frame, write_frame_csv};
use ppmi_model::columns::{
    bids_participant_id, COL_ASSESSMENT_NAME, COL_ASSESSMENT_SCORE, COL_BIDS_ID,
    COL_PARTICIPANT_ID, COL_VISIT_ID,
};
use ppmi_model::CurationError;

use crate::join::{merge_frames, JoinHow};

// dashboard (long form) column names
pub const COL_DASH_BIDS_ID: &str = "bids_id";
pub const COL_DASH_SESSION: &str = "session";

/// Joins demographics and assessments into the wide bagel frame.
///
/// Duplicate participant-visit rows mean an upstream filter failed;
/// the offending rows are written to `side_file` and the bagel is
/// rejected.
pub fn build_bagel(
    demographics: &DataFrame,
    assessments: &DataFrame,
    side_file: &Path,
) -> Result<DataFrame> {
    let merged = merge_frames(
        demographics,
        assessments,
        &[COL_PARTICIPANT_ID, COL_VISIT_ID],
        JoinHow::Outer,
    )?
    .df;

    // drop fully identical rows before keying
    let headers: Vec<String> = merged
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    let columns: Vec<Vec<String>> = headers
        .iter()
        .map(|name| column_values(&merged, name))
        .collect::<Result<_>>()?;
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for row_idx in 0..merged.height() {
        let row: Vec<String> = columns.iter().map(|col| col[row_idx].clone()).collect();
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }

    let idx_participant = headers
        .iter()
        .position(|name| name == COL_PARTICIPANT_ID)
        .ok_or_else(|| CurationError::Message("bagel lost its participant column".into()))?;
    let idx_visit = headers
        .iter()
        .position(|name| name == COL_VISIT_ID)
        .ok_or_else(|| CurationError::Message("bagel lost its visit column".into()))?;

    // rebuild with the BIDS id right after the participant id
    let mut out_headers = headers.clone();
    out_headers.insert(1, COL_BIDS_ID.to_string());
    let out_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            out.insert(1, bids_participant_id(&row[idx_participant]));
            out
        })
        .collect();

    let mut key_counts: BTreeSet<(String, String)> = BTreeSet::new();
    let mut duplicated: Vec<bool> = Vec::with_capacity(rows.len());
    for row in &rows {
        duplicated
            .push(!key_counts.insert((row[idx_participant].clone(), row[idx_visit].clone())));
    }
    // a repeated key flags every row carrying it, first one included
    let offending_keys: BTreeSet<(String, String)> = rows
        .iter()
        .zip(&duplicated)
        .filter(|(_, dup)| **dup)
        .map(|(row, _)| (row[idx_participant].clone(), row[idx_visit].clone()))
        .collect();

    let df = rows_to_frame(&out_headers, &out_rows)?;
    if !offending_keys.is_empty() {
        let offender_rows: Vec<Vec<String>> = out_rows
            .iter()
            .zip(&rows)
            .filter(|(_, row)| {
                offending_keys
                    .contains(&(row[idx_participant].clone(), row[idx_visit].clone()))
            })
            .map(|(out, _)| out.clone())
            .collect();
        let count = offender_rows.len();
        let offenders = rows_to_frame(&out_headers, &offender_rows)?;
        write_frame_csv(&offenders, side_file)?;
        warn!(count, side_file = %side_file.display(), "bagel has duplicate rows");
        bail!(CurationError::DuplicateBagelRows {
            count,
            side_file: side_file.to_path_buf(),
        });
    }

    info!(rows = df.height(), columns = df.width(), "assembled bagel");
    Ok(df)
}

/// Melts the wide bagel into one row per (participant, visit,
/// assessment) for the dashboard, with BIDS session labels.
pub fn dashboard_bagel(bagel: &DataFrame) -> Result<DataFrame> {
    let id_columns = [COL_BIDS_ID, COL_PARTICIPANT_ID, COL_VISIT_ID];
    let headers: Vec<String> = bagel
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    for id_column in id_columns {
        if !headers.iter().any(|name| name == id_column) {
            bail!(CurationError::Message(format!(
                "bagel is missing column {id_column}"
            )));
        }
    }

    let bids = column_values(bagel, COL_BIDS_ID)?;
    let participants = column_values(bagel, COL_PARTICIPANT_ID)?;
    let visits = column_values(bagel, COL_VISIT_ID)?;

    let value_columns: Vec<&String> = headers
        .iter()
        .filter(|name| !id_columns.contains(&name.as_str()))
        .collect();

    let capacity = bagel.height() * value_columns.len();
    let mut out_bids = Vec::with_capacity(capacity);
    let mut out_participants = Vec::with_capacity(capacity);
    let mut out_sessions = Vec::with_capacity(capacity);
    let mut out_names = Vec::with_capacity(capacity);
    let mut out_scores = Vec::with_capacity(capacity);
    for name in &value_columns {
        let values = column_values(bagel, name)?;
        for row in 0..bagel.height() {
            out_bids.push(bids[row].clone());
            out_participants.push(participants[row].clone());
            out_sessions.push(format!("ses-{}", visits[row]));
            out_names.push((*name).clone());
            out_scores.push(values[row].clone());
        }
    }

    string_frame(vec![
        (COL_DASH_BIDS_ID, out_bids),
        (COL_PARTICIPANT_ID, out_participants),
        (COL_DASH_SESSION, out_sessions),
        (COL_ASSESSMENT_NAME, out_names),
        (COL_ASSESSMENT_SCORE, out_scores),
    ])
}

fn rows_to_frame(headers: &[String], rows: &[Vec<String>]) -> Result<DataFrame> {
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value.clone());
        }
    }
    string_frame(headers.iter().map(String::as_str).zip(columns).collect())
}
