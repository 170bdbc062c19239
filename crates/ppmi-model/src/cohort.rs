//! Research group normalization and cohort keep-list.

use crate::error::{CurationError, Result};

/// Canonical cohort labels the manifest keeps.
pub const GROUPS_KEEP: [&str; 4] = [
    "Parkinson's Disease",
    "Prodromal",
    "Healthy Control",
    "SWEDD",
];

/// Normalizes an imaging `Research Group` value to its canonical
/// cohort label.
///
/// The enumeration is closed: non-kept groups (Phantom, GenReg Unaff)
/// map to themselves so the keep-list can drop them, while a label
/// outside the table is fatal, the same way an unmapped visit is.
pub fn normalize_group(group: &str) -> Result<&'static str> {
    let label = match group.trim() {
        "PD" => "Parkinson's Disease",
        "Control" => "Healthy Control",
        "Prodromal" => "Prodromal",
        "SWEDD" => "SWEDD",
        "Phantom" => "Phantom",
        "GenReg Unaff" => "GenReg Unaff",
        other => return Err(CurationError::UnmappedGroup(other.to_string())),
    };
    Ok(label)
}

/// Whether a canonical cohort label is part of the curated dataset.
pub fn is_kept_group(group: &str) -> bool {
    GROUPS_KEEP.contains(&group)
}
