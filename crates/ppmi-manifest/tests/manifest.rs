//! End-to-end manifest generation over on-disk fixtures.

use std::fs;

use ppmi_classify::DescriptionMap;
use ppmi_ingest::{cell, column_values, load_imaging_inventory, save_frame_with_backup};
use ppmi_manifest::{
    attach_cohorts, build_manifest, imaging_availability, load_cohort_table, load_manifest,
    reconcile_manifest, COLS_MANIFEST,
};
use ppmi_model::{AdvisoryLog, AnatSuffix};
use ppmi_tabular::tabular_info_and_merge;

fn description_map() -> DescriptionMap {
    let mut map = DescriptionMap::default();
    map.anat
        .set_suffix(AnatSuffix::T1w, vec!["MPRAGE".to_string()]);
    map.dwi = vec!["AX DTI 32 DIR".to_string()];
    map
}

#[test]
fn manifest_builds_and_appends_across_runs() {
    let dir = tempfile::tempdir().unwrap();

    let inventory_path = dir.path().join("idaSearch.csv");
    fs::write(
        &inventory_path,
        "Subject ID,Visit,Research Group,Modality,Description,Imaging Protocol,Image ID\n\
         3000,Baseline,PD,MRI,MPRAGE,,1001\n\
         3000,Baseline,PD,DTI,AX DTI 32 DIR,,1002\n\
         3001,Baseline,Control,MRI,MPRAGE,,1003\n",
    )
    .unwrap();

    fs::write(
        dir.path().join("demographics.csv"),
        "PATNO,EVENT_ID,AGE_AT_VISIT\n3000,BL,61.5\n3000,V04,62.0\n3001,BL,70.1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("groups.csv"),
        "PATNO,COHORT_DEFINITION\n3000,Parkinson's Disease\n3001,Healthy Control\n",
    )
    .unwrap();

    let mut sources = std::collections::BTreeMap::new();
    sources.insert(
        "age".to_string(),
        ppmi_model::TabularFileSpec {
            filepath: "demographics.csv".into(),
            column: "AGE_AT_VISIT".to_string(),
            is_static: false,
            description: None,
        },
    );
    let visits = vec!["BL".to_string(), "V04".to_string()];

    let mut advisories = AdvisoryLog::new();
    let inventory = load_imaging_inventory(&inventory_path).unwrap();
    let nonstatic =
        tabular_info_and_merge(&sources, dir.path(), &visits, None, &mut advisories).unwrap();
    let cohorts = load_cohort_table(&dir.path().join("groups.csv")).unwrap();
    let nonstatic = attach_cohorts(&nonstatic, &cohorts, &inventory, &mut advisories).unwrap();
    let imaging =
        imaging_availability(&inventory, &description_map(), &visits, &mut advisories).unwrap();
    let manifest = build_manifest(&nonstatic, &imaging, &mut advisories).unwrap();
    let manifest = reconcile_manifest(&manifest, None, false).unwrap();

    assert_eq!(manifest.get_column_names_str(), COLS_MANIFEST.to_vec());
    assert_eq!(manifest.height(), 3);
    assert_eq!(cell(&manifest, "participant_id", 0).unwrap(), "3000");
    assert_eq!(cell(&manifest, "datatype", 0).unwrap(), r#"["anat","dwi"]"#);
    // visit with tabular data only
    assert_eq!(cell(&manifest, "visit_id", 1).unwrap(), "V04");
    assert_eq!(cell(&manifest, "datatype", 1).unwrap(), "[]");

    let manifest_path = dir.path().join("manifest.csv");
    assert!(save_frame_with_backup(&manifest, &manifest_path, false).unwrap());

    // second run with a new visit for 3001 appends without touching old rows
    fs::write(
        dir.path().join("demographics.csv"),
        "PATNO,EVENT_ID,AGE_AT_VISIT\n3000,BL,61.5\n3000,V04,62.0\n3001,BL,70.1\n3001,V04,71.2\n",
    )
    .unwrap();
    let nonstatic =
        tabular_info_and_merge(&sources, dir.path(), &visits, None, &mut advisories).unwrap();
    let nonstatic = attach_cohorts(&nonstatic, &cohorts, &inventory, &mut advisories).unwrap();
    let rebuilt = build_manifest(&nonstatic, &imaging, &mut advisories).unwrap();

    let old = load_manifest(&manifest_path).unwrap();
    let combined = reconcile_manifest(&rebuilt, Some(&old), false).unwrap();
    assert_eq!(combined.height(), 4);
    let visits_3001: Vec<String> = column_values(&combined, "visit_id")
        .unwrap()
        .into_iter()
        .zip(column_values(&combined, "participant_id").unwrap())
        .filter(|(_, subject)| subject == "3001")
        .map(|(visit, _)| visit)
        .collect();
    assert_eq!(visits_3001, vec!["BL".to_string(), "V04".to_string()]);

    // shrinking the dataset must fail loudly
    assert!(reconcile_manifest(&manifest, Some(&combined), true).is_err());
}
