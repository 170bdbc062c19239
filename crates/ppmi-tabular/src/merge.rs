//! Loading and merging of configured tabular sources.
//!
//! Static sources (one value per subject) and longitudinal sources
//! (one value per subject-visit) are merged separately, then aligned
//! on an index of subject-visit pairs, usually the manifest.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use polars::prelude::DataFrame;
use tracing::{info, warn};

use ppmi_ingest::{column_values, load_tabular_source, select_columns};
use ppmi_model::columns::{COL_PARTICIPANT_ID, COL_VISIT_ID};
use ppmi_model::{AdvisoryKind, AdvisoryLog, CurationError, TabularFileSpec};

use crate::filters::apply_loading_filters;
use crate::join::{merge_against_index, merge_frame_list, merge_frames, JoinHow};

/// Configured sources split by grain, each group pre-merged.
pub struct TabularInfo {
    pub static_df: Option<DataFrame>,
    pub nonstatic_df: Option<DataFrame>,
}

/// Loads every configured source, applies the duplicate-resolution
/// filters, and merges the static and longitudinal groups.
pub fn load_tabular_info(
    sources: &BTreeMap<String, TabularFileSpec>,
    base_dir: &Path,
    visits: &[String],
    advisories: &mut AdvisoryLog,
) -> Result<TabularInfo> {
    let mut static_frames: Vec<DataFrame> = Vec::new();
    let mut nonstatic_frames: Vec<DataFrame> = Vec::new();

    for (output_column, spec) in sources {
        let path = base_dir.join(&spec.filepath);
        let visits_keep: &[String] = if spec.is_static { &[] } else { visits };
        let df = load_tabular_source(
            &path,
            &spec.column,
            output_column,
            spec.is_static,
            visits_keep,
            Some(&apply_loading_filters),
        )?;
        info!(
            column = output_column.as_str(),
            rows = df.height(),
            static_ = spec.is_static,
            "loaded tabular source"
        );

        if spec.is_static {
            static_frames.push(df);
        } else {
            if has_single_row_per_subject(&df)? {
                let msg = format!(
                    "source for column {output_column} has a single row per subject \
                     but is not marked as static"
                );
                warn!("{msg}");
                advisories.push(AdvisoryKind::SourceShape, msg);
            }
            nonstatic_frames.push(df);
        }
    }

    Ok(TabularInfo {
        static_df: merge_frame_list(static_frames, &[COL_PARTICIPANT_ID])?,
        nonstatic_df: merge_frame_list(
            nonstatic_frames,
            &[COL_PARTICIPANT_ID, COL_VISIT_ID],
        )?,
    })
}

/// Aligns the merged groups on an index of subject-visit pairs.
///
/// When `index` is given (the manifest), rows on the data side that
/// have no index entry are reported as merge residue. Without an
/// index the longitudinal keys serve as one.
pub fn merge_tabular_info(
    info: &TabularInfo,
    index: Option<&DataFrame>,
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let Some(nonstatic) = &info.nonstatic_df else {
        bail!(CurationError::NoLongitudinalSource);
    };
    let Some(static_df) = &info.static_df else {
        return Ok(nonstatic.clone());
    };

    let check = index.is_some();
    let index = match index {
        Some(df) => select_columns(df, &[COL_PARTICIPANT_ID, COL_VISIT_ID])?,
        None => select_columns(nonstatic, &[COL_PARTICIPANT_ID, COL_VISIT_ID])?,
    };

    let nonstatic = merge_against_index(
        &index,
        nonstatic,
        &[COL_PARTICIPANT_ID, COL_VISIT_ID],
        check,
        advisories,
    )?;
    let static_df =
        merge_against_index(&index, static_df, &[COL_PARTICIPANT_ID], check, advisories)?;
    let merged = merge_frames(
        &static_df,
        &nonstatic,
        &[COL_PARTICIPANT_ID, COL_VISIT_ID],
        JoinHow::Inner,
    )?;
    Ok(merged.df)
}

/// Loads, filters, merges, and aligns in one call.
pub fn tabular_info_and_merge(
    sources: &BTreeMap<String, TabularFileSpec>,
    base_dir: &Path,
    visits: &[String],
    index: Option<&DataFrame>,
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let info = load_tabular_info(sources, base_dir, visits, advisories)?;
    merge_tabular_info(&info, index, advisories)
}

fn has_single_row_per_subject(df: &DataFrame) -> Result<bool> {
    let subjects = column_values(df, COL_PARTICIPANT_ID)?;
    if subjects.is_empty() {
        return Ok(false);
    }
    let mut counts: BTreeMap<&String, usize> = BTreeMap::new();
    for subject in &subjects {
        *counts.entry(subject).or_default() += 1;
    }
    Ok(counts.values().all(|count| *count == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn spec(filepath: &str, column: &str, is_static: bool) -> TabularFileSpec {
        TabularFileSpec {
            filepath: PathBuf::from(filepath),
            column: column.to_string(),
            is_static,
            description: None,
        }
    }

    fn visits() -> Vec<String> {
        vec!["BL".to_string(), "V04".to_string()]
    }

    #[test]
    fn static_and_longitudinal_sources_align_on_the_visit_grain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("edu.csv"),
            "PATNO,EDUCYRS\n3000,16\n3001,12\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("moca.csv"),
            "PATNO,EVENT_ID,MCATOT\n3000,BL,27\n3000,V04,26\n3001,BL,29\n",
        )
        .unwrap();

        let mut sources = BTreeMap::new();
        sources.insert("education".to_string(), spec("edu.csv", "EDUCYRS", true));
        sources.insert("moca".to_string(), spec("moca.csv", "MCATOT", false));

        let mut advisories = AdvisoryLog::default();
        let df =
            tabular_info_and_merge(&sources, dir.path(), &visits(), None, &mut advisories)
                .unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(
            df.get_column_names_str(),
            vec!["participant_id", "visit_id", "education", "moca"]
        );
        let row = |i: usize| {
            (
                ppmi_ingest::cell(&df, "participant_id", i).unwrap(),
                ppmi_ingest::cell(&df, "visit_id", i).unwrap(),
                ppmi_ingest::cell(&df, "education", i).unwrap(),
                ppmi_ingest::cell(&df, "moca", i).unwrap(),
            )
        };
        assert_eq!(
            row(0),
            (
                "3000".to_string(),
                "BL".to_string(),
                "16".to_string(),
                "27".to_string()
            )
        );
        assert_eq!(
            row(2),
            (
                "3001".to_string(),
                "BL".to_string(),
                "12".to_string(),
                "29".to_string()
            )
        );
    }

    #[test]
    fn missing_longitudinal_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("edu.csv"), "PATNO,EDUCYRS\n3000,16\n").unwrap();

        let mut sources = BTreeMap::new();
        sources.insert("education".to_string(), spec("edu.csv", "EDUCYRS", true));

        let mut advisories = AdvisoryLog::default();
        let err =
            tabular_info_and_merge(&sources, dir.path(), &visits(), None, &mut advisories)
                .unwrap_err();
        assert!(err.to_string().contains("subject and visit"));
    }

    #[test]
    fn rows_missing_from_the_index_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("edu.csv"), "PATNO,EDUCYRS\n3000,16\n").unwrap();
        fs::write(
            dir.path().join("moca.csv"),
            "PATNO,EVENT_ID,MCATOT\n3000,BL,27\n3002,BL,30\n",
        )
        .unwrap();

        let mut sources = BTreeMap::new();
        sources.insert("education".to_string(), spec("edu.csv", "EDUCYRS", true));
        sources.insert("moca".to_string(), spec("moca.csv", "MCATOT", false));

        let index = ppmi_ingest::string_frame(vec![
            ("participant_id", vec!["3000".to_string()]),
            ("visit_id", vec!["BL".to_string()]),
        ])
        .unwrap();

        let mut advisories = AdvisoryLog::default();
        let df = tabular_info_and_merge(
            &sources,
            dir.path(),
            &visits(),
            Some(&index),
            &mut advisories,
        )
        .unwrap();

        assert_eq!(advisories.count_of(AdvisoryKind::MergeResidue), 1);
        // the final alignment on the static side drops the residue row
        assert_eq!(df.height(), 1);
        assert_eq!(
            ppmi_ingest::cell(&df, "participant_id", 0).unwrap(),
            "3000"
        );
    }

    #[test]
    fn single_row_per_subject_longitudinal_source_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("moca.csv"),
            "PATNO,EVENT_ID,MCATOT\n3000,BL,27\n3001,BL,29\n",
        )
        .unwrap();

        let mut sources = BTreeMap::new();
        sources.insert("moca".to_string(), spec("moca.csv", "MCATOT", false));

        let mut advisories = AdvisoryLog::default();
        load_tabular_info(&sources, dir.path(), &visits(), &mut advisories).unwrap();
        assert_eq!(advisories.count_of(AdvisoryKind::SourceShape), 1);
    }
}
