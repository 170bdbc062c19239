//! Imaging inventory loading.
//!
//! The inventory is the CSV exported by the image archive search
//! (one row per image series). Loading canonicalizes the subject
//! column, maps visit labels to study event codes, and normalizes
//! research-group labels. An unmapped visit or group is fatal: a new
//! label in a fresh download must be triaged, not silently dropped.

use std::path::Path;

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use ppmi_model::columns::{
    COL_DESCRIPTION_IMAGING, COL_GROUP_IMAGING, COL_GROUP_TABULAR, COL_IMAGE_ID,
    COL_MODALITY_IMAGING, COL_PARTICIPANT_ID, COL_PROTOCOL_IMAGING, COL_SESSION_ID,
    COL_SUBJECT_IMAGING, COL_VISIT_ID, COL_VISIT_IMAGING,
};
use ppmi_model::{cohort, visits};

use crate::csv_table::read_string_frame;
use crate::polars_utils::{column_values, require_columns};

/// Loads and canonicalizes the imaging inventory CSV.
///
/// The returned frame has `participant_id`, `visit_id`, `session_id`
/// and `COHORT_DEFINITION` columns alongside the original description,
/// modality, protocol, and image-ID columns.
pub fn load_imaging_inventory(path: &Path) -> Result<DataFrame> {
    let mut df = read_string_frame(path)?;
    require_columns(
        &df,
        path,
        &[
            COL_SUBJECT_IMAGING,
            COL_VISIT_IMAGING,
            COL_GROUP_IMAGING,
            COL_MODALITY_IMAGING,
            COL_DESCRIPTION_IMAGING,
            COL_IMAGE_ID,
        ],
    )?;

    // some exports omit the protocol column; classification treats it as blank
    if !df
        .get_column_names_str()
        .iter()
        .any(|name| *name == COL_PROTOCOL_IMAGING)
    {
        let blanks = vec![String::new(); df.height()];
        df.with_column(Column::new(COL_PROTOCOL_IMAGING.into(), blanks))?;
    }

    df.rename(COL_SUBJECT_IMAGING, COL_PARTICIPANT_ID.into())?;

    let visit_labels = column_values(&df, COL_VISIT_IMAGING)?;
    let mut visit_ids = Vec::with_capacity(visit_labels.len());
    for label in &visit_labels {
        visit_ids.push(visits::visit_code(label)?.to_string());
    }
    df.with_column(Column::new(COL_VISIT_ID.into(), visit_ids.clone()))?;
    // imaging visits double as sessions
    df.with_column(Column::new(COL_SESSION_ID.into(), visit_ids))?;

    let groups = column_values(&df, COL_GROUP_IMAGING)?;
    let mut cohorts = Vec::with_capacity(groups.len());
    for group in &groups {
        cohorts.push(cohort::normalize_group(group)?.to_string());
    }
    df.with_column(Column::new(COL_GROUP_TABULAR.into(), cohorts))?;

    info!(
        rows = df.height(),
        path = %path.display(),
        "loaded imaging inventory"
    );
    Ok(df)
}
