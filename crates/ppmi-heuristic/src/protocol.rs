//! Imaging-protocol metadata parsing.
//!
//! The archive's protocol column packs key=value pairs separated by
//! semicolons, e.g. `Acquisition Plane=SAGITTAL;Acquisition Type=3D`.

use std::collections::BTreeMap;

use anyhow::{Result, bail};

use ppmi_model::CurationError;

pub const KEY_PLANE: &str = "Acquisition Plane";
pub const KEY_DIMS: &str = "Acquisition Type";

/// Acquisition plane tag used in BIDS `acq-` entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Plane {
    Sagittal,
    Coronal,
    Axial,
}

impl Plane {
    pub fn tag(&self) -> &'static str {
        match self {
            Plane::Sagittal => "sag",
            Plane::Coronal => "cor",
            Plane::Axial => "ax",
        }
    }

    pub fn all() -> [Plane; 3] {
        [Plane::Sagittal, Plane::Coronal, Plane::Axial]
    }

    /// Parses the protocol metadata value.
    pub fn from_protocol(value: &str) -> Option<Plane> {
        match value {
            "SAGITTAL" => Some(Plane::Sagittal),
            "CORONAL" => Some(Plane::Coronal),
            "AXIAL" => Some(Plane::Axial),
            _ => None,
        }
    }

    /// Parses a configured tag value ("sag", "cor", "ax").
    pub fn from_tag(tag: &str) -> Option<Plane> {
        Plane::all().into_iter().find(|plane| plane.tag() == tag)
    }
}

/// Acquisition dimensionality tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AcqDims {
    TwoD,
    ThreeD,
}

impl AcqDims {
    pub fn tag(&self) -> &'static str {
        match self {
            AcqDims::TwoD => "2D",
            AcqDims::ThreeD => "3D",
        }
    }

    pub fn all() -> [AcqDims; 2] {
        [AcqDims::TwoD, AcqDims::ThreeD]
    }

    pub fn from_protocol(value: &str) -> Option<AcqDims> {
        match value {
            "2D" => Some(AcqDims::TwoD),
            "3D" => Some(AcqDims::ThreeD),
            _ => None,
        }
    }

    pub fn from_tag(tag: &str) -> Option<AcqDims> {
        AcqDims::all().into_iter().find(|dims| dims.tag() == tag)
    }
}

/// Parses a protocol string into key/value pairs.
///
/// An entry without a `=` separator is malformed; the caller decides
/// whether that is fatal (testing mode) or a skip (production).
pub fn parse_protocol_info(image_id: &str, raw: &str) -> Result<BTreeMap<String, String>> {
    let mut parsed = BTreeMap::new();
    if raw.trim().is_empty() {
        return Ok(parsed);
    }
    for entry in raw.split(';') {
        let Some((key, value)) = entry.split_once('=') else {
            bail!(CurationError::MalformedProtocolEntry {
                image_id: image_id.to_string(),
                entry: entry.to_string(),
            });
        };
        parsed.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(parsed)
}

/// Scans a description for a plane tag. Two different tags is a hard
/// error (an ambiguous description must be triaged by hand).
pub fn plane_from_description(description: &str) -> Result<Option<Plane>> {
    let lowered = description.to_lowercase();
    let mut found = None;
    for plane in Plane::all() {
        if lowered.contains(plane.tag()) {
            if found.is_some() {
                bail!(CurationError::AmbiguousTag {
                    kind: "plane".to_string(),
                    description: description.to_string(),
                });
            }
            found = Some(plane);
        }
    }
    Ok(found)
}

/// Scans a description for a 2D/3D tag, same ambiguity rule as planes.
pub fn dims_from_description(description: &str) -> Result<Option<AcqDims>> {
    let lowered = description.to_lowercase();
    let mut found = None;
    for dims in AcqDims::all() {
        if lowered.contains(&dims.tag().to_lowercase()) {
            if found.is_some() {
                bail!(CurationError::AmbiguousTag {
                    kind: "dims".to_string(),
                    description: description.to_string(),
                });
            }
            found = Some(dims);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_string_parses_to_pairs() {
        let parsed = parse_protocol_info(
            "100",
            "Acquisition Plane=SAGITTAL;Acquisition Type=3D;Field Strength=3.0",
        )
        .unwrap();
        assert_eq!(parsed[KEY_PLANE], "SAGITTAL");
        assert_eq!(parsed[KEY_DIMS], "3D");
        assert_eq!(Plane::from_protocol(&parsed[KEY_PLANE]), Some(Plane::Sagittal));
    }

    #[test]
    fn malformed_entry_is_an_error() {
        let err = parse_protocol_info("100", "Acquisition Plane").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CurationError>(),
            Some(CurationError::MalformedProtocolEntry { .. })
        ));
    }

    #[test]
    fn empty_protocol_parses_to_nothing() {
        assert!(parse_protocol_info("100", "  ").unwrap().is_empty());
    }

    #[test]
    fn description_tags_resolve_plane_and_dims() {
        assert_eq!(
            plane_from_description("AX FLAIR").unwrap(),
            Some(Plane::Axial)
        );
        assert_eq!(
            dims_from_description("3D T2 FSE").unwrap(),
            Some(AcqDims::ThreeD)
        );
        assert_eq!(plane_from_description("MPRAGE").unwrap(), None);
    }

    #[test]
    fn double_tag_is_ambiguous() {
        assert!(plane_from_description("SAG then AX reformat").is_err());
    }
}
