//! Hardcoded special cases and DWI tag tables.
//!
//! A handful of archive images carry descriptions too mangled for the
//! description map (wrong modality, ambiguous text, parsed as NA by the
//! converter). They are pinned here by image ID.

use std::sync::LazyLock;

use regex::Regex;

use ppmi_model::category::AnatSuffix;

use crate::bids_key::BidsKey;
use crate::protocol::{AcqDims, Plane};

/// Neuromelanin descriptions: 'NM' or a GRE-MT family name.
pub static RE_NEUROMELANIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)(nm)|(gre.*mt)").unwrap());

/// BIDS `acq-NM` entity value for neuromelanin scans.
pub const TAG_NEUROMELANIN: &str = "NM";

/// Resolves an image to its pinned key, if it has one.
pub fn hardcoded_key(image_id: &str, description: &str) -> Option<BidsKey> {
    // T1 sagittal 3D: ambiguous descriptions ("MRI MAGNETIC RESONANCE
    // EXAM", "PPMI 2.0", "MR"), sT1W_3D_TFE series with DTI modality,
    // and MPRAGE_ASO series parsed as NA by the converter
    let t1_sag_3d = [
        "1609526", "1680311", "1196642", "1119726", "1120679", "1397807", "1397808",
    ];
    if t1_sag_3d.contains(&image_id) || description == "sT1W_3D_TFE" {
        return Some(BidsKey::anat(
            AnatSuffix::T1w,
            Some(Plane::Sagittal),
            Some(AcqDims::ThreeD),
            None,
        ));
    }
    if image_id == "1609534" {
        return Some(BidsKey::anat(
            AnatSuffix::Flair,
            Some(Plane::Sagittal),
            Some(AcqDims::ThreeD),
            None,
        ));
    }
    if image_id == "1397805" {
        return Some(BidsKey::anat(
            AnatSuffix::T2w,
            Some(Plane::Axial),
            Some(AcqDims::TwoD),
            None,
        ));
    }
    if image_id == "1680316" || image_id == "1680317" {
        return Some(BidsKey::dwi(None, None));
    }
    None
}

/// Acquisition tag for AP/PA diffusion scans, by exact description.
pub fn dwi_acq_from_description(description: &str) -> Option<&'static str> {
    match description {
        "DTI_B0_PA" | "DTI_revB0_AP" => Some("B0"),
        "DTI_B700_64dir_PA" => Some("B700"),
        "DTI_B1000_64dir_PA" => Some("B1000"),
        "DTI_B2000_64dir_PA" => Some("B2000"),
        _ => None,
    }
}

const VALID_DIRS: [&str; 4] = ["AP", "PA", "LR", "RL"];

static DIR_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    VALID_DIRS
        .iter()
        .map(|dir| {
            let bytes = dir.as_bytes();
            // catches ' R L', '_RL', 'R-L', 'R > L', ...
            let pattern = format!(
                r"[ \-_]{}[ \-_>]*{}(?:[ \-_]|$)",
                bytes[0] as char, bytes[1] as char
            );
            (*dir, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Phase-encoding direction for a diffusion description.
///
/// Exact fixups first (scanner naming that the regex cannot catch),
/// then the per-direction pattern.
pub fn dwi_dir_from_description(description: &str) -> Option<&'static str> {
    let lr_exact = [
        "2D DTI EPI FAT SHIFT LEFT",
        "AX DTI 32 DIR FAT SHIFT L",
        "AX DTI 32 DIR FAT SHIFT L NO ANGLE",
        "AX DTI _reverse", // one subject has this and 'AX DTI _RL'
    ];
    let rl_exact = [
        "2D DTI EPI FAT SHIFT RIGHT",
        "AX DTI 32 DIR FAT SHIFT R",
        "AX DTI 32 DIR FAT SHIFT R NO ANGLE",
    ];
    if lr_exact.contains(&description) {
        return Some("LR");
    }
    if rl_exact.contains(&description) {
        return Some("RL");
    }
    for (dir, re) in DIR_RES.iter() {
        if re.is_match(description) {
            return Some(dir);
        }
    }
    None
}
