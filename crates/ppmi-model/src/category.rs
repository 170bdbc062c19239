//! Type-safe enumerations for BIDS datatypes and anatomical suffixes.
//!
//! The PPMI imaging inventory records a free-text `Modality` tag per
//! series; each BIDS datatype expects exactly one of those tags, but the
//! tag is not reliable on its own, which is why the description classifier
//! exists at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// BIDS datatype directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Datatype {
    /// Anatomical scans (`anat/`).
    Anat,
    /// Diffusion-weighted scans (`dwi/`).
    Dwi,
    /// Functional scans (`func/`).
    Func,
}

impl Datatype {
    /// Returns the BIDS directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Anat => "anat",
            Datatype::Dwi => "dwi",
            Datatype::Func => "func",
        }
    }

    /// Returns the PPMI inventory `Modality` tag expected for this datatype.
    pub fn modality_tag(&self) -> &'static str {
        match self {
            Datatype::Anat => "MRI",
            Datatype::Dwi => "DTI",
            Datatype::Func => "fMRI",
        }
    }

    /// All datatypes, in the classifier's fixed priority order.
    pub fn all() -> [Datatype; 3] {
        [Datatype::Dwi, Datatype::Func, Datatype::Anat]
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anat" => Ok(Datatype::Anat),
            "dwi" => Ok(Datatype::Dwi),
            "func" => Ok(Datatype::Func),
            _ => Err(format!("Unknown datatype: {s}")),
        }
    }
}

/// BIDS filename suffix for anatomical scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnatSuffix {
    T1w,
    T2w,
    T2starw,
    Flair,
}

impl AnatSuffix {
    /// Returns the BIDS suffix string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnatSuffix::T1w => "T1w",
            AnatSuffix::T2w => "T2w",
            AnatSuffix::T2starw => "T2starw",
            AnatSuffix::Flair => "FLAIR",
        }
    }

    /// All anatomical suffixes, in the classifier's fixed priority order.
    pub fn all() -> [AnatSuffix; 4] {
        [
            AnatSuffix::T1w,
            AnatSuffix::T2w,
            AnatSuffix::T2starw,
            AnatSuffix::Flair,
        ]
    }
}

impl fmt::Display for AnatSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnatSuffix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "T1w" => Ok(AnatSuffix::T1w),
            "T2w" => Ok(AnatSuffix::T2w),
            "T2starw" => Ok(AnatSuffix::T2starw),
            "FLAIR" => Ok(AnatSuffix::Flair),
            _ => Err(format!("Unknown anatomical suffix: {s}")),
        }
    }
}

/// Resolved classification of one imaging series.
///
/// Closed variant over the three datatypes; anatomical series always carry
/// their suffix, so "anat with unknown suffix" is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageCategory {
    Anatomical(AnatSuffix),
    Diffusion,
    Functional,
}

impl ImageCategory {
    pub fn datatype(&self) -> Datatype {
        match self {
            ImageCategory::Anatomical(_) => Datatype::Anat,
            ImageCategory::Diffusion => Datatype::Dwi,
            ImageCategory::Functional => Datatype::Func,
        }
    }

    pub fn suffix(&self) -> Option<AnatSuffix> {
        match self {
            ImageCategory::Anatomical(suffix) => Some(*suffix),
            ImageCategory::Diffusion | ImageCategory::Functional => None,
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCategory::Anatomical(suffix) => write!(f, "anat/{suffix}"),
            ImageCategory::Diffusion => write!(f, "dwi"),
            ImageCategory::Functional => write!(f, "func"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_round_trips() {
        for datatype in Datatype::all() {
            assert_eq!(datatype.as_str().parse::<Datatype>().unwrap(), datatype);
        }
    }

    #[test]
    fn modality_tags_are_distinct() {
        assert_eq!(Datatype::Dwi.modality_tag(), "DTI");
        assert_eq!(Datatype::Func.modality_tag(), "fMRI");
        assert_eq!(Datatype::Anat.modality_tag(), "MRI");
    }

    #[test]
    fn category_exposes_datatype_and_suffix() {
        let category = ImageCategory::Anatomical(AnatSuffix::Flair);
        assert_eq!(category.datatype(), Datatype::Anat);
        assert_eq!(category.suffix(), Some(AnatSuffix::Flair));
        assert_eq!(ImageCategory::Diffusion.suffix(), None);
        assert_eq!(category.to_string(), "anat/FLAIR");
    }
}
