//! Tabular study-data loading.
//!
//! Each configured source contributes exactly one value column; the
//! loader canonicalizes the subject/visit key columns and projects the
//! frame down to key + value so downstream merges stay predictable.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use polars::prelude::DataFrame;
use ppmi_model::columns::{
    COL_PARTICIPANT_ID, COL_SUBJECT_TABULAR, COL_VISIT_ID, COL_VISIT_TABULAR,
};

use crate::csv_table::read_string_frame;
use crate::polars_utils::{cell, filter_rows, require_columns, select_columns};

/// Hook applied to a raw source frame before canonicalization (e.g.
/// the duplicate-resolution filters).
pub type LoadingFilter<'a> = &'a dyn Fn(DataFrame) -> Result<DataFrame>;

/// Loads one tabular source and projects it to key + value columns.
///
/// Static sources keep only the subject key; longitudinal sources keep
/// subject and visit, restricted to `visits_keep` when non-empty.
pub fn load_tabular_source(
    path: &Path,
    value_column: &str,
    output_column: &str,
    is_static: bool,
    visits_keep: &[String],
    loading_filter: Option<LoadingFilter<'_>>,
) -> Result<DataFrame> {
    let mut df = read_string_frame(path)?;
    if let Some(filter) = loading_filter {
        df = filter(df)?;
    }

    require_columns(&df, path, &[COL_SUBJECT_TABULAR, value_column])?;
    df.rename(COL_SUBJECT_TABULAR, COL_PARTICIPANT_ID.into())?;
    if value_column != output_column {
        df.rename(value_column, output_column.into())?;
    }

    if is_static {
        return select_columns(&df, &[COL_PARTICIPANT_ID, output_column]);
    }

    require_columns(&df, path, &[COL_VISIT_TABULAR])?;
    df.rename(COL_VISIT_TABULAR, COL_VISIT_ID.into())?;
    if !visits_keep.is_empty() {
        let mut keep = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let visit = cell(&df, COL_VISIT_ID, row)?;
            keep.push(visits_keep.iter().any(|v| *v == visit));
        }
        let before = df.height();
        df = filter_rows(&df, &keep)?;
        debug!(
            dropped = before - df.height(),
            path = %path.display(),
            "restricted tabular source to configured visits"
        );
    }
    select_columns(&df, &[COL_PARTICIPANT_ID, COL_VISIT_ID, output_column])
}
