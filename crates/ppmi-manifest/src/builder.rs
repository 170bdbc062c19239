//! Manifest assembly from the imaging inventory and merged tabular data.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::{info, warn};

use ppmi_classify::DescriptionMap;
use ppmi_heuristic::RE_NEUROMELANIN;
use ppmi_ingest::{
    column_values, filter_rows, read_string_frame, require_columns, select_columns, string_frame,
};
use ppmi_model::cohort::{is_kept_group, GROUPS_KEEP};
use ppmi_model::columns::{
    COL_DATATYPE, COL_GROUP_TABULAR, COL_NEUROMELANIN, COL_PARTICIPANT_ID, COL_SESSION_ID,
    COL_SUBJECT_TABULAR, COL_VISIT_ID,
};
use ppmi_model::{AdvisoryKind, AdvisoryLog, Datatype};
use ppmi_tabular::{merge_frames, JoinHow};

use crate::store::COLS_MANIFEST;

/// Loads the cohort (research group) table keyed by subject.
pub fn load_cohort_table(path: &Path) -> Result<DataFrame> {
    let mut df = read_string_frame(path)?;
    require_columns(&df, path, &[COL_SUBJECT_TABULAR, COL_GROUP_TABULAR])?;
    df.rename(COL_SUBJECT_TABULAR, COL_PARTICIPANT_ID.into())?;
    select_columns(&df, &[COL_PARTICIPANT_ID, COL_GROUP_TABULAR])
}

/// Attaches a cohort column to the merged longitudinal frame.
///
/// Subjects absent from the cohort table borrow the cohort observed on
/// the imaging side when it is unambiguous there; anything else stays
/// blank and falls out of the keep-list filter later.
pub fn attach_cohorts(
    nonstatic: &DataFrame,
    cohorts: &DataFrame,
    inventory: &DataFrame,
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let mut cohort_by_subject: BTreeMap<String, String> = BTreeMap::new();
    let subjects = column_values(cohorts, COL_PARTICIPANT_ID)?;
    let labels = column_values(cohorts, COL_GROUP_TABULAR)?;
    for (subject, label) in subjects.iter().zip(&labels) {
        cohort_by_subject
            .entry(subject.clone())
            .or_insert_with(|| label.clone());
    }

    let mut imaging_cohorts: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let imaging_subjects = column_values(inventory, COL_PARTICIPANT_ID)?;
    let imaging_labels = column_values(inventory, COL_GROUP_TABULAR)?;
    for (subject, label) in imaging_subjects.iter().zip(&imaging_labels) {
        imaging_cohorts
            .entry(subject.clone())
            .or_default()
            .insert(label.clone());
    }

    let participants = column_values(nonstatic, COL_PARTICIPANT_ID)?;
    let mut assigned = Vec::with_capacity(participants.len());
    let mut missing: BTreeSet<&String> = BTreeSet::new();
    let mut recovered: BTreeSet<&String> = BTreeSet::new();
    let mut unresolved: BTreeSet<&String> = BTreeSet::new();
    for participant in &participants {
        if let Some(label) = cohort_by_subject.get(participant) {
            assigned.push(label.clone());
            continue;
        }
        missing.insert(participant);
        // recover only when the imaging side agrees with itself
        match imaging_cohorts.get(participant) {
            Some(labels) if labels.len() == 1 => {
                recovered.insert(participant);
                assigned.push(labels.iter().next().cloned().unwrap_or_default());
            }
            _ => {
                unresolved.insert(participant);
                assigned.push(String::new());
            }
        }
    }

    if !missing.is_empty() {
        warn!(
            subjects = missing.len(),
            "some subjects in tabular data do not belong to any research group"
        );
    }
    if !recovered.is_empty() {
        let msg = format!(
            "filled in missing cohort for {} subject(s) using imaging data",
            recovered.len()
        );
        info!("{msg}");
        advisories.push(AdvisoryKind::CohortResolution, msg);
    }
    if !unresolved.is_empty() {
        let msg = format!(
            "could not resolve a cohort for {} subject(s): {:?}",
            unresolved.len(),
            unresolved
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::CohortResolution, msg);
    }

    let mut out = nonstatic.clone();
    out.with_column(polars::prelude::Column::new(
        COL_GROUP_TABULAR.into(),
        assigned,
    ))?;
    Ok(out)
}

/// Collapses the inventory to per-(subject, visit, session) datatype
/// availability rows.
///
/// The datatype cell is a sorted JSON list of the datatypes whose
/// description buckets matched at least one series; the neuromelanin
/// cell records whether any series description matched the NM pattern.
pub fn imaging_availability(
    inventory: &DataFrame,
    map: &DescriptionMap,
    expected_sessions: &[String],
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let reverse = map.reverse_index(advisories);

    let sessions = column_values(inventory, COL_SESSION_ID)?;
    let present: BTreeSet<&String> = sessions.iter().collect();
    let missing_sessions: Vec<&String> = expected_sessions
        .iter()
        .filter(|session| !present.contains(session))
        .collect();
    if !missing_sessions.is_empty() {
        warn!(
            ?missing_sessions,
            "did not encounter all configured sessions in the inventory"
        );
    }

    let keep: Vec<bool> = sessions
        .iter()
        .map(|session| expected_sessions.iter().any(|s| s == session))
        .collect();
    let dropped_sessions = keep.iter().filter(|k| !**k).count();
    let df = filter_rows(inventory, &keep)?;
    if dropped_sessions > 0 {
        let msg = format!(
            "dropped {dropped_sessions} imaging entries with sessions outside \
             {expected_sessions:?}"
        );
        info!("{msg}");
        advisories.push(AdvisoryKind::DroppedRow, msg);
    }

    let groups = column_values(&df, COL_GROUP_TABULAR)?;
    let present_groups: BTreeSet<&String> = groups.iter().collect();
    let missing_groups: Vec<&str> = GROUPS_KEEP
        .iter()
        .copied()
        .filter(|group| !present_groups.iter().any(|g| g.as_str() == *group))
        .collect();
    if !missing_groups.is_empty() {
        warn!(
            ?missing_groups,
            "did not encounter all kept research groups in the inventory"
        );
    }

    let keep: Vec<bool> = groups.iter().map(|group| is_kept_group(group)).collect();
    let dropped_groups = keep.iter().filter(|k| !**k).count();
    let df = filter_rows(&df, &keep)?;
    if dropped_groups > 0 {
        let msg = format!(
            "dropped {dropped_groups} imaging entries with research groups outside \
             {GROUPS_KEEP:?}"
        );
        info!("{msg}");
        advisories.push(AdvisoryKind::DroppedRow, msg);
    }

    let participants = column_values(&df, COL_PARTICIPANT_ID)?;
    let visits = column_values(&df, COL_VISIT_ID)?;
    let sessions = column_values(&df, COL_SESSION_ID)?;
    let descriptions =
        column_values(&df, ppmi_model::columns::COL_DESCRIPTION_IMAGING)?;

    let mut grouped: BTreeMap<(String, String, String), Vec<&String>> = BTreeMap::new();
    for idx in 0..df.height() {
        grouped
            .entry((
                participants[idx].clone(),
                visits[idx].clone(),
                sessions[idx].clone(),
            ))
            .or_default()
            .push(&descriptions[idx]);
    }

    let mut seen_datatypes: BTreeSet<Datatype> = BTreeSet::new();
    let mut out_participants = Vec::with_capacity(grouped.len());
    let mut out_visits = Vec::with_capacity(grouped.len());
    let mut out_sessions = Vec::with_capacity(grouped.len());
    let mut out_datatypes = Vec::with_capacity(grouped.len());
    let mut out_neuromelanin = Vec::with_capacity(grouped.len());
    for ((participant, visit, session), series) in grouped {
        let datatypes: BTreeSet<&str> = series
            .iter()
            .filter_map(|description| reverse.get(description.as_str()))
            .map(|datatype| {
                seen_datatypes.insert(*datatype);
                datatype.as_str()
            })
            .collect();
        let neuromelanin = series
            .iter()
            .any(|description| RE_NEUROMELANIN.is_match(description));

        out_participants.push(participant);
        out_visits.push(visit);
        out_sessions.push(session);
        out_datatypes.push(serde_json::to_string(
            &datatypes.into_iter().collect::<Vec<_>>(),
        )?);
        out_neuromelanin.push(bool_cell(neuromelanin));
    }

    let missing_datatypes: Vec<Datatype> = Datatype::all()
        .iter()
        .copied()
        .filter(|datatype| !seen_datatypes.contains(datatype))
        .collect();
    if !missing_datatypes.is_empty() {
        warn!(
            ?missing_datatypes,
            "did not encounter all datatypes in the description map"
        );
    }

    string_frame(vec![
        (COL_PARTICIPANT_ID, out_participants),
        (COL_VISIT_ID, out_visits),
        (COL_SESSION_ID, out_sessions),
        (COL_DATATYPE, out_datatypes),
        (COL_NEUROMELANIN, out_neuromelanin),
    ])
}

/// Builds the manifest frame from cohort-annotated tabular rows and
/// the imaging availability frame.
///
/// Subjects with imaging data but no demographics are dropped; their
/// rows cannot be trusted without a tabular identity.
pub fn build_manifest(
    nonstatic: &DataFrame,
    imaging: &DataFrame,
    advisories: &mut AdvisoryLog,
) -> Result<DataFrame> {
    let groups = column_values(nonstatic, COL_GROUP_TABULAR)?;
    let keep: Vec<bool> = groups.iter().map(|group| is_kept_group(group)).collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    let nonstatic = filter_rows(nonstatic, &keep)?;
    if dropped > 0 {
        info!(
            dropped,
            "dropped tabular entries with research groups outside the keep-list"
        );
    }

    let merged = merge_frames(
        &nonstatic,
        imaging,
        &[COL_PARTICIPANT_ID, COL_VISIT_ID],
        JoinHow::Outer,
    )?
    .df;

    let tabular_subjects: BTreeSet<String> =
        column_values(&nonstatic, COL_PARTICIPANT_ID)?.into_iter().collect();
    let merged_subjects = column_values(&merged, COL_PARTICIPANT_ID)?;
    let orphans: BTreeSet<&String> = merged_subjects
        .iter()
        .filter(|subject| !tabular_subjects.contains(*subject))
        .collect();
    if !orphans.is_empty() {
        let msg = format!(
            "{} subject(s) have imaging data but no demographic information: {:?}; \
             dropping them from the manifest",
            orphans.len(),
            orphans
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::DroppedRow, msg);
    }
    let keep: Vec<bool> = merged_subjects
        .iter()
        .map(|subject| tabular_subjects.contains(subject))
        .collect();
    let merged = filter_rows(&merged, &keep)?;

    // visits without imaging get an empty datatype list and no NM flag
    let datatypes: Vec<String> = column_values(&merged, COL_DATATYPE)?
        .into_iter()
        .map(|value| if value.is_empty() { "[]".to_string() } else { value })
        .collect();
    let neuromelanin: Vec<String> = column_values(&merged, COL_NEUROMELANIN)?
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                bool_cell(false)
            } else {
                value
            }
        })
        .collect();
    let mut merged = merged;
    merged.with_column(polars::prelude::Column::new(COL_DATATYPE.into(), datatypes))?;
    merged.with_column(polars::prelude::Column::new(
        COL_NEUROMELANIN.into(),
        neuromelanin,
    ))?;

    let manifest = select_columns(&merged, &COLS_MANIFEST)?;
    info!(
        rows = manifest.height(),
        "assembled manifest from tabular and imaging data"
    );
    Ok(manifest)
}

pub(crate) fn bool_cell(value: bool) -> String {
    if value { "True".to_string() } else { "False".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppmi_ingest::cell;
    use ppmi_model::AnatSuffix;

    fn inventory() -> DataFrame {
        let columns = vec![
            (
                COL_PARTICIPANT_ID,
                vec!["3000", "3000", "3000", "3001", "3002"],
            ),
            (COL_VISIT_ID, vec!["BL", "BL", "V04", "BL", "BL"]),
            (COL_SESSION_ID, vec!["BL", "BL", "V04", "BL", "BL"]),
            (
                COL_GROUP_TABULAR,
                vec![
                    "Parkinson's Disease",
                    "Parkinson's Disease",
                    "Parkinson's Disease",
                    "Phantom",
                    "Healthy Control",
                ],
            ),
            (
                ppmi_model::columns::COL_DESCRIPTION_IMAGING,
                vec!["MPRAGE", "2D GRE-MT", "AX DTI", "MPRAGE", "rsfMRI"],
            ),
        ];
        string_frame(
            columns
                .into_iter()
                .map(|(name, values)| {
                    (name, values.into_iter().map(str::to_string).collect())
                })
                .collect(),
        )
        .unwrap()
    }

    fn description_map() -> DescriptionMap {
        let mut map = DescriptionMap::default();
        map.anat
            .set_suffix(AnatSuffix::T1w, vec!["MPRAGE".to_string(), "2D GRE-MT".to_string()]);
        map.dwi = vec!["AX DTI".to_string()];
        map.func = vec!["rsfMRI".to_string()];
        map
    }

    fn sessions() -> Vec<String> {
        vec!["BL".to_string(), "V04".to_string()]
    }

    #[test]
    fn availability_rows_aggregate_datatypes_and_neuromelanin() {
        let mut advisories = AdvisoryLog::new();
        let df =
            imaging_availability(&inventory(), &description_map(), &sessions(), &mut advisories)
                .unwrap();

        // the Phantom subject is dropped by the group keep-list
        assert_eq!(df.height(), 3);
        assert_eq!(cell(&df, COL_PARTICIPANT_ID, 0).unwrap(), "3000");
        assert_eq!(cell(&df, COL_DATATYPE, 0).unwrap(), r#"["anat"]"#);
        assert_eq!(cell(&df, COL_NEUROMELANIN, 0).unwrap(), "True");
        assert_eq!(cell(&df, COL_DATATYPE, 1).unwrap(), r#"["dwi"]"#);
        assert_eq!(cell(&df, COL_NEUROMELANIN, 1).unwrap(), "False");
        assert_eq!(cell(&df, COL_PARTICIPANT_ID, 2).unwrap(), "3002");
        assert_eq!(cell(&df, COL_DATATYPE, 2).unwrap(), r#"["func"]"#);
        assert_eq!(advisories.count_of(AdvisoryKind::DroppedRow), 1);
    }

    #[test]
    fn out_of_session_rows_are_dropped_with_an_advisory() {
        let mut advisories = AdvisoryLog::new();
        let df = imaging_availability(
            &inventory(),
            &description_map(),
            &["BL".to_string()],
            &mut advisories,
        )
        .unwrap();
        assert!(column_values(&df, COL_SESSION_ID)
            .unwrap()
            .iter()
            .all(|session| session == "BL"));
        assert_eq!(advisories.count_of(AdvisoryKind::DroppedRow), 2);
    }

    #[test]
    fn cohorts_recover_from_imaging_when_unambiguous() {
        let nonstatic = string_frame(vec![
            (
                COL_PARTICIPANT_ID,
                vec!["3000".to_string(), "3002".to_string(), "3999".to_string()],
            ),
            (
                COL_VISIT_ID,
                vec!["BL".to_string(), "BL".to_string(), "BL".to_string()],
            ),
        ])
        .unwrap();
        let cohorts = string_frame(vec![
            (COL_PARTICIPANT_ID, vec!["3000".to_string()]),
            (
                COL_GROUP_TABULAR,
                vec!["Parkinson's Disease".to_string()],
            ),
        ])
        .unwrap();

        let mut advisories = AdvisoryLog::new();
        let out = attach_cohorts(&nonstatic, &cohorts, &inventory(), &mut advisories).unwrap();
        assert_eq!(
            cell(&out, COL_GROUP_TABULAR, 0).unwrap(),
            "Parkinson's Disease"
        );
        // 3002 appears in imaging with a single group
        assert_eq!(cell(&out, COL_GROUP_TABULAR, 1).unwrap(), "Healthy Control");
        // 3999 is nowhere on the imaging side
        assert_eq!(cell(&out, COL_GROUP_TABULAR, 2).unwrap(), "");
        assert_eq!(advisories.count_of(AdvisoryKind::CohortResolution), 2);
    }

    #[test]
    fn manifest_drops_imaging_only_subjects_and_fills_blanks() {
        let nonstatic = string_frame(vec![
            (
                COL_PARTICIPANT_ID,
                vec!["3000".to_string(), "3000".to_string()],
            ),
            (COL_VISIT_ID, vec!["BL".to_string(), "V06".to_string()]),
            (
                "moca",
                vec!["27".to_string(), "26".to_string()],
            ),
            (
                COL_GROUP_TABULAR,
                vec![
                    "Parkinson's Disease".to_string(),
                    "Parkinson's Disease".to_string(),
                ],
            ),
        ])
        .unwrap();
        let mut advisories = AdvisoryLog::new();
        let imaging = imaging_availability(
            &inventory(),
            &description_map(),
            &sessions(),
            &mut advisories,
        )
        .unwrap();

        let manifest = build_manifest(&nonstatic, &imaging, &mut advisories).unwrap();
        assert_eq!(
            manifest.get_column_names_str(),
            COLS_MANIFEST.to_vec()
        );
        // 3002 had imaging but no tabular rows
        assert!(!column_values(&manifest, COL_PARTICIPANT_ID)
            .unwrap()
            .contains(&"3002".to_string()));
        // V06 has tabular data but no imaging
        let row_v06 = column_values(&manifest, COL_VISIT_ID)
            .unwrap()
            .iter()
            .position(|visit| visit == "V06")
            .unwrap();
        assert_eq!(cell(&manifest, COL_DATATYPE, row_v06).unwrap(), "[]");
        assert_eq!(cell(&manifest, COL_NEUROMELANIN, row_v06).unwrap(), "False");
        assert_eq!(cell(&manifest, COL_SESSION_ID, row_v06).unwrap(), "");
    }
}
