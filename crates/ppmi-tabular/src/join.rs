//! Row-wise frame joins over string keys.
//!
//! The frames here are small (one row per subject-visit), so joins are
//! done with key maps rather than a query engine; that keeps the merge
//! indicator and residue reporting explicit.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::warn;

use ppmi_ingest::{column_values, string_frame};
use ppmi_model::{AdvisoryKind, AdvisoryLog};

/// Join strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHow {
    Outer,
    Inner,
}

/// Join result with merge-indicator counts.
pub struct MergeOutcome {
    pub df: DataFrame,
    /// Rows only present in the left frame.
    pub left_only: usize,
    /// Rows only present in the right frame.
    pub right_only: usize,
}

struct FrameView {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn frame_view(df: &DataFrame) -> Result<FrameView> {
    let headers: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    let columns: Vec<Vec<String>> = headers
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<_>>()?;
    let mut rows = vec![Vec::with_capacity(headers.len()); df.height()];
    for column in &columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value.clone());
        }
    }
    Ok(FrameView { headers, rows })
}

fn key_indices(headers: &[String], on: &[&str]) -> Result<Vec<usize>> {
    on.iter()
        .map(|key| {
            headers
                .iter()
                .position(|header| header == key)
                .ok_or_else(|| anyhow::anyhow!("join key {key:?} missing from frame"))
        })
        .collect()
}

fn key_of(row: &[String], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|idx| row[*idx].clone()).collect()
}

/// Joins two frames on the given key columns.
///
/// Output columns are the keys, then the non-key left columns, then
/// the non-key right columns. Matching rows pair up cross-product
/// style, like a relational join.
pub fn merge_frames(
    left: &DataFrame,
    right: &DataFrame,
    on: &[&str],
    how: JoinHow,
) -> Result<MergeOutcome> {
    let left_view = frame_view(left)?;
    let right_view = frame_view(right)?;
    let left_keys = key_indices(&left_view.headers, on)?;
    let right_keys = key_indices(&right_view.headers, on)?;

    let left_value_cols: Vec<usize> = (0..left_view.headers.len())
        .filter(|idx| !left_keys.contains(idx))
        .collect();
    let right_value_cols: Vec<usize> = (0..right_view.headers.len())
        .filter(|idx| !right_keys.contains(idx))
        .collect();

    let mut right_index: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
    for (idx, row) in right_view.rows.iter().enumerate() {
        right_index
            .entry(key_of(row, &right_keys))
            .or_default()
            .push(idx);
    }

    let mut out_headers: Vec<String> = on.iter().map(|key| (*key).to_string()).collect();
    out_headers.extend(left_value_cols.iter().map(|idx| left_view.headers[*idx].clone()));
    out_headers.extend(
        right_value_cols
            .iter()
            .map(|idx| right_view.headers[*idx].clone()),
    );

    let mut out_rows: Vec<Vec<String>> = Vec::new();
    let mut matched_right: Vec<bool> = vec![false; right_view.rows.len()];
    let mut left_only = 0usize;

    for row in &left_view.rows {
        let key = key_of(row, &left_keys);
        let left_values: Vec<String> = left_value_cols.iter().map(|idx| row[*idx].clone()).collect();
        match right_index.get(&key) {
            Some(matches) => {
                for right_idx in matches {
                    matched_right[*right_idx] = true;
                    let mut out = key.clone();
                    out.extend(left_values.iter().cloned());
                    out.extend(
                        right_value_cols
                            .iter()
                            .map(|idx| right_view.rows[*right_idx][*idx].clone()),
                    );
                    out_rows.push(out);
                }
            }
            None => {
                left_only += 1;
                if how == JoinHow::Outer {
                    let mut out = key.clone();
                    out.extend(left_values.iter().cloned());
                    out.extend(right_value_cols.iter().map(|_| String::new()));
                    out_rows.push(out);
                }
            }
        }
    }

    let right_only = matched_right.iter().filter(|m| !**m).count();
    if how == JoinHow::Outer {
        for (idx, row) in right_view.rows.iter().enumerate() {
            if matched_right[idx] {
                continue;
            }
            let mut out = key_of(row, &right_keys);
            out.extend(left_value_cols.iter().map(|_| String::new()));
            out.extend(right_value_cols.iter().map(|col| row[*col].clone()));
            out_rows.push(out);
        }
    }

    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(out_rows.len()); out_headers.len()];
    for row in &out_rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value.clone());
        }
    }
    let df = string_frame(
        out_headers
            .iter()
            .map(String::as_str)
            .zip(columns)
            .collect(),
    )?;
    Ok(MergeOutcome {
        df,
        left_only,
        right_only,
    })
}

/// Outer-joins a list of frames on shared keys, reduce style.
pub fn merge_frame_list(frames: Vec<DataFrame>, on: &[&str]) -> Result<Option<DataFrame>> {
    let mut iter = frames.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let mut merged = first;
    for frame in iter {
        merged = merge_frames(&merged, &frame, on, JoinHow::Outer)?.df;
    }
    Ok(Some(merged))
}

/// Outer-joins `df` onto an index frame and reports rows that exist
/// only on the data side; those indicate an index (manifest) that is
/// out of date.
pub fn merge_against_index(
    index: &DataFrame,
    df: &DataFrame,
    on: &[&str],
    check: bool,
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let outcome = merge_frames(index, df, on, JoinHow::Outer)?;
    if check && outcome.right_only > 0 {
        let msg = format!(
            "{} tabular row(s) do not match the manifest index; the manifest is \
             probably out of date",
            outcome.right_only
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::MergeResidue, msg);
    }
    Ok(outcome.df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppmi_ingest::cell;

    fn frame(cols: Vec<(&str, Vec<&str>)>) -> DataFrame {
        string_frame(
            cols.into_iter()
                .map(|(name, values)| {
                    (name, values.into_iter().map(str::to_string).collect())
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn outer_join_keeps_both_sides() {
        let left = frame(vec![
            ("participant_id", vec!["3000", "3001"]),
            ("moca", vec!["27", "25"]),
        ]);
        let right = frame(vec![
            ("participant_id", vec!["3001", "3002"]),
            ("updrs", vec!["12", "30"]),
        ]);
        let outcome =
            merge_frames(&left, &right, &["participant_id"], JoinHow::Outer).unwrap();
        assert_eq!(outcome.df.height(), 3);
        assert_eq!(outcome.left_only, 1);
        assert_eq!(outcome.right_only, 1);

        // unmatched cells read back as empty
        assert_eq!(cell(&outcome.df, "updrs", 0).unwrap(), "");
        assert_eq!(cell(&outcome.df, "moca", 2).unwrap(), "");
    }

    #[test]
    fn inner_join_keeps_matches_only() {
        let left = frame(vec![
            ("participant_id", vec!["3000", "3001"]),
            ("visit_id", vec!["BL", "BL"]),
            ("a", vec!["1", "2"]),
        ]);
        let right = frame(vec![
            ("participant_id", vec!["3001"]),
            ("visit_id", vec!["BL"]),
            ("b", vec!["9"]),
        ]);
        let outcome = merge_frames(
            &left,
            &right,
            &["participant_id", "visit_id"],
            JoinHow::Inner,
        )
        .unwrap();
        assert_eq!(outcome.df.height(), 1);
        assert_eq!(cell(&outcome.df, "a", 0).unwrap(), "2");
        assert_eq!(cell(&outcome.df, "b", 0).unwrap(), "9");
    }

    #[test]
    fn index_merge_flags_residue() {
        let index = frame(vec![("participant_id", vec!["3000"])]);
        let data = frame(vec![
            ("participant_id", vec!["3000", "9999"]),
            ("val", vec!["1", "2"]),
        ]);
        let mut advisories = AdvisoryLog::new();
        merge_against_index(&index, &data, &["participant_id"], true, &mut advisories)
            .unwrap();
        assert_eq!(advisories.count_of(AdvisoryKind::MergeResidue), 1);
    }
}
