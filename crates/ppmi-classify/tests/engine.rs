use polars::prelude::DataFrame;

use ppmi_classify::{classify_inventory, ignored_descriptions};
use ppmi_ingest::string_frame;
use ppmi_model::AdvisoryKind;
use ppmi_model::category::{AnatSuffix, ImageCategory};

fn inventory(rows: &[(&str, &str)]) -> DataFrame {
    let modalities: Vec<String> = rows.iter().map(|(m, _)| (*m).to_string()).collect();
    let descriptions: Vec<String> = rows.iter().map(|(_, d)| (*d).to_string()).collect();
    let protocols = vec![String::new(); rows.len()];
    string_frame(vec![
        ("Modality", modalities),
        ("Description", descriptions),
        ("Imaging Protocol", protocols),
    ])
    .unwrap()
}

#[test]
fn classifies_each_modality_into_its_datatype() {
    let df = inventory(&[
        ("DTI", "AX DTI 32 DIR"),
        ("fMRI", "rsfMRI"),
        ("MRI", "MPRAGE GRAPPA"),
        ("MRI", "AX T2 FSE"),
    ]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(map.dwi, vec!["AX DTI 32 DIR"]);
    assert_eq!(map.func, vec!["rsfMRI"]);
    assert_eq!(map.anat.t1w, vec!["MPRAGE GRAPPA"]);
    assert_eq!(map.anat.t2w, vec!["AX T2 FSE"]);
}

#[test]
fn reject_substrings_drop_derived_series() {
    let df = inventory(&[("DTI", "AX DTI 32 DIR"), ("DTI", "DTI_LR_ADC")]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(map.dwi, vec!["AX DTI 32 DIR"]);

    let ignored = ignored_descriptions(&df, &map).unwrap();
    assert_eq!(ignored, vec!["DTI_LR_ADC"]);
}

#[test]
fn cross_modality_recovery_adds_mislabeled_series() {
    // a T1 series exported under the DTI modality is recovered through
    // the out-of-modality pass of the T1w target
    let df = inventory(&[("DTI", "sT1W_3D_TFE"), ("MRI", "MPRAGE GRAPPA")]);
    let (map, advisories) = classify_inventory(&df).unwrap();
    assert!(map.anat.t1w.contains(&"sT1W_3D_TFE".to_string()));
    // and it never lands in dwi: it is on the dwi exact exclude list
    assert!(map.dwi.is_empty());
    assert!(advisories.count_of(AdvisoryKind::CrossModalityDuplicate) > 0);
}

#[test]
fn neuromelanin_exception_rescues_rejected_description() {
    // '2D GRE-MT' trips the '2d' rejection but is a neuromelanin T1
    let df = inventory(&[("MRI", "2D GRE-MT")]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(map.anat.t1w, vec!["2D GRE-MT"]);
    assert!(map.func.is_empty());
}

#[test]
fn flair_descriptions_skip_the_t2_bucket() {
    let df = inventory(&[("MRI", "T2 FLAIR"), ("MRI", "AX T2 FSE")]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(map.anat.t2w, vec!["AX T2 FSE"]);
    assert_eq!(map.anat.flair, vec!["T2 FLAIR"]);
    assert!(map.anat.t2starw.is_empty());
}

#[test]
fn later_suffixes_exclude_earlier_acceptances() {
    // an unlabeled anat series is accepted by T1w (with a suspicious
    // advisory) and must not reappear under T2w or FLAIR
    let df = inventory(&[("MRI", "Weird Series")]);
    let (map, advisories) = classify_inventory(&df).unwrap();
    assert_eq!(map.anat.t1w, vec!["Weird Series"]);
    assert!(map.anat.t2w.is_empty());
    assert!(map.anat.flair.is_empty());
    assert!(advisories.count_of(AdvisoryKind::SuspiciousDescription) > 0);
}

#[test]
fn anatomical_exclusions_leave_localizers_unassigned() {
    let df = inventory(&[("MRI", "SURVEY"), ("MRI", "MPRAGE GRAPPA")]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(map.anat.t1w, vec!["MPRAGE GRAPPA"]);
    assert_eq!(ignored_descriptions(&df, &map).unwrap(), vec!["SURVEY"]);
}

#[test]
fn category_lookup_follows_reverse_precedence() {
    let df = inventory(&[
        ("MRI", "MPRAGE GRAPPA"),
        ("DTI", "AX DTI 32 DIR"),
        ("fMRI", "rsfMRI"),
    ]);
    let (map, _) = classify_inventory(&df).unwrap();
    assert_eq!(
        map.category_of("MPRAGE GRAPPA"),
        Some(ImageCategory::Anatomical(AnatSuffix::T1w))
    );
    assert_eq!(map.category_of("AX DTI 32 DIR"), Some(ImageCategory::Diffusion));
    assert_eq!(map.category_of("rsfMRI"), Some(ImageCategory::Functional));
    assert_eq!(map.category_of("not a series"), None);
}
