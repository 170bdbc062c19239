//! Classification rule tables for the PPMI imaging inventory.
//!
//! These lists were curated against real inventory downloads; every
//! entry earned its place by misclassifying something at some point.
//! Matching semantics live in [`DatatypeRule`]; this module only builds
//! the records.

use ppmi_model::category::AnatSuffix;
use ppmi_model::rules::{DatatypeRule, strings};

/// Substrings commonly found in diffusion descriptions.
fn common_dwi() -> Vec<String> {
    strings(&["dti", "dw", "DT_SSh_iso"])
}

/// Substrings commonly found in functional descriptions.
fn common_func() -> Vec<String> {
    strings(&["fmri", "bold", "rsmri"])
}

fn common_anat_t1() -> Vec<String> {
    // neuromelanin scans are all T1
    strings(&["t1", "mprage", "nm"])
}

fn common_anat_t2() -> Vec<String> {
    strings(&["t2"])
}

fn common_anat_t2_star() -> Vec<String> {
    strings(&["t2_star", "t2*"])
}

fn common_anat_flair() -> Vec<String> {
    strings(&["flair"])
}

/// Diffusion rule.
pub fn rule_dwi() -> DatatypeRule {
    DatatypeRule {
        common_substrings: common_dwi(),
        exclude_in: strings(&[
            "T1",
            "T2",
            "sT1W_3D_TFE",
            "TRA/DUAL", // SWI/FLAIR
            "MR",       // phantom subject
            "DTI_FA",   // phantom (solar eclipse)
            "DTI_gated_FA",
            "DTI Sequence_FA",
            "DTI_gated AC-PC LINE_FA",
            "DTI_LR_ColFA",
            "DTI_RL_ColFA",
            "DTI_LR_FA",
            "DTI_RL_FA",
        ]),
        exclude_out: strings(&[
            "PPMI 2.0",
            "DTI (30Axis)",
            "eDW_SSh SENSE",
            "dDW_SSh SENSE",
            "DW_SSh separate",
            "dDW_SSh ADC",
            "DTI_RL_TRACEW",
            "DTI_LR_TRACEW",
            "DTI_RL_ADC",
            "DTI_RL_FA",
            "DTI_LR_ADC",
            "DTI_LR_FA",
            "DTI_RL_ColFA",
            "DTI_LR_ColFA",
            "DTI_B1000_64dir_PA_ADC",
            "DTI_B1000_64dir_PA_TRACEW",
            "DTI_B700_64dir_PA_ADC",
            "DTI_B700_64dir_PA_TRACEW",
        ]),
        reject_substrings: strings(&["phantom", "adc", "trace"]),
        ..DatatypeRule::default()
    }
}

/// Functional rule.
pub fn rule_func() -> DatatypeRule {
    DatatypeRule {
        common_substrings: common_func(),
        exclude_in: strings(&[
            "NM - MT", // neuromelanin
            "2 NM-GRE",
            "NM-MT",
            "MODIFIED 2D GRE MT MTC-NO 2 DYN COND IMPLANT",
            "2D GRE_MT", // 2D
            "2D GRE-MT",
            "2D GRE MT MTC-NO",
            "DTI_B0_PA", // DTI
            "DTI_revB0_AP",
            "t2_localizer", // localizer
        ]),
        exclude_out: strings(&["rsfMRI_PA_Do Not Use"]),
        reject_substrings: strings(&["phantom"]),
        ..DatatypeRule::default()
    }
}

/// Out-of-modality exclusions shared by every anatomical suffix.
pub fn exclude_out_anat() -> Vec<String> {
    strings(&["PPMI 2.0", "TRA/DUAL", "t2_localizer"])
}

/// Within-modality exclusions shared by every anatomical suffix.
pub fn exclude_in_anat() -> Vec<String> {
    strings(&[
        // 2D
        "ax t1 reformat",
        "AX DUAL_TSE",
        "DUAL_TSE",
        "TRA/DUAL",
        "AX DE TSE",
        "SURVEY",
        "Double_TSE",
        "localizer",
        "3 Plane Localizer",
        "TRA", // 55 slices in one dimension
        "SAG",
        "COR",
        "LOCALIZER",
        "COR T2 loc",
        "3 plane",
        "3 PLANE LOC",
        "HighResHippo",
        "MIDLINE SAG LOC",
        "AX PD  5/1",
        "sag",
        "MPR - SmartBrain", // only 1 slice
        // other
        "B0map_v1",
        "B0rf Map",
        "Cal Head 24",
        "SAG SPGR", // field strength 0.7 Tesla
        "Anon",     // not anat
        "Field_mapping",
        "GRE B0",
        "GRE B0 map",
        "GRE",
        "IsoADC", // not anat
        "t2_tirm_tra_dark-fluid NO BLADE",
        "t2_tirm_tra_dark-fluid_",
        "MoCoSeries",
        // clipped
        "Transverse", // top/bottom of brain not complete
        "Coronal",    // front/back of brain not complete
    ])
}

/// T1-specific additions to the shared anatomical exclusions.
pub fn exclude_in_anat_t1() -> Vec<String> {
    let mut list = exclude_in_anat();
    list.extend(strings(&["Ax 3D SWAN GRE straight", "MRI BRAIN WO IVCON"]));
    list
}

fn reject_substrings_anat() -> Vec<String> {
    let mut list = strings(&["2d", "phantom"]);
    list.extend(common_dwi());
    list.extend(common_func());
    list
}

/// Anatomical rule for one suffix. The reject list bars the other
/// suffixes' common substrings so each description lands in at most
/// one suffix bucket on the within-modality pass.
pub fn rule_anat(suffix: AnatSuffix) -> DatatypeRule {
    let (common, others): (Vec<String>, Vec<Vec<String>>) = match suffix {
        AnatSuffix::T1w => (
            common_anat_t1(),
            vec![common_anat_t2(), common_anat_t2_star(), common_anat_flair()],
        ),
        AnatSuffix::T2w => (
            common_anat_t2(),
            vec![common_anat_t1(), common_anat_t2_star(), common_anat_flair()],
        ),
        AnatSuffix::T2starw => (
            common_anat_t2_star(),
            vec![common_anat_t1(), common_anat_flair()],
        ),
        AnatSuffix::Flair => (
            common_anat_flair(),
            vec![common_anat_t1(), common_anat_t2_star()],
        ),
    };

    let mut reject = reject_substrings_anat();
    for other in others {
        reject.extend(other);
    }

    let reject_exceptions = match suffix {
        AnatSuffix::T1w => strings(&[
            "T1 REPEAT2", // contains 'T2'
            // neuromelanin, contains '2D'
            "2D GRE-NM",
            "2D GRE-NMMT",
            "2D GRE-NM_MT",
            "2D GRE - MT",
            "2D GRE MT",
            "2D GRE MT MTC-NO",
            "2D GRE-MT",
            "2D GRE-MT 1",
            "2D GRE-MT 2",
            "2D GRE-MT 3",
            "2D GRE-MT 4",
            "2D GRE-MT 5",
            "2D GRE-MT Q9R1007332",
            "2D GRE-MT_ACPC",
            "2D GRE-MT_RPT2",
            "2D GRE_MT",
            "2D-GRE MT",
            "2D-GRE-MT",
            "2DGRE-MT",
            "2D_GRE-MT",
            "2D_GRE_MT",
            "AX 2D GRE-MT",
            "AXIAL 2D GRE-MT",
            "LOWER 2D GRE MT",
        ]),
        _ => Vec::new(),
    };

    DatatypeRule {
        common_substrings: common,
        exclude_out: exclude_out_anat(),
        reject_substrings: reject,
        reject_substrings_exceptions: reject_exceptions,
        ..DatatypeRule::default()
    }
}
