//! Curation configuration loaded from the dataset's JSON config file.
//!
//! The on-disk format keeps the upper-case key style of the dataset
//! config files this tool is pointed at, so existing configs load as-is.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CurationError, Result};

/// A plain file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    #[serde(rename = "FILEPATH")]
    pub filepath: PathBuf,
    #[serde(rename = "DESCRIPTION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A tabular study-data source: one CSV contributing one value column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularFileSpec {
    #[serde(rename = "FILEPATH")]
    pub filepath: PathBuf,
    #[serde(rename = "COLUMN")]
    pub column: String,
    /// Static sources carry one value per subject; non-static sources
    /// are longitudinal (subject and visit).
    #[serde(rename = "IS_STATIC")]
    pub is_static: bool,
    #[serde(rename = "DESCRIPTION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Series-count special case for the heuristic evaluator.
///
/// Some series are mislabeled at the scanner and can only be told apart
/// by their file count. Kept as data so new site quirks are a config
/// edit, not a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeCountOverride {
    #[serde(rename = "DESCRIPTION")]
    pub description: String,
    #[serde(rename = "MODALITY")]
    pub modality: String,
    #[serde(rename = "FILE_COUNTS")]
    pub file_counts: Vec<usize>,
    #[serde(rename = "PLANE", default = "default_override_plane")]
    pub plane: String,
    #[serde(rename = "DIMS", default = "default_override_dims")]
    pub dims: String,
}

fn default_override_plane() -> String {
    "sag".to_string()
}

fn default_override_dims() -> String {
    "3D".to_string()
}

/// Dataset-level curation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    #[serde(rename = "DEMOGRAPHICS")]
    pub demographics: BTreeMap<String, TabularFileSpec>,
    #[serde(rename = "ASSESSMENTS")]
    pub assessments: BTreeMap<String, TabularFileSpec>,
    #[serde(rename = "IMAGING_INFO")]
    pub imaging_info: FileSpec,
    /// Description-map JSON path. Written by `filter-descriptions`,
    /// read by everything else, so existence is not validated.
    #[serde(
        rename = "IMAGE_DESCRIPTIONS",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_descriptions: Option<FileSpec>,
    #[serde(rename = "VISITS", default = "default_visits")]
    pub visits: Vec<String>,
    #[serde(rename = "SESSIONS", default = "default_sessions")]
    pub sessions: Vec<String>,
    #[serde(rename = "VOLUME_COUNT_OVERRIDES", default = "default_volume_overrides")]
    pub volume_count_overrides: Vec<VolumeCountOverride>,
}

fn default_visits() -> Vec<String> {
    [
        "SC", "BL", "R01", "V04", "V06", "V08", "V10", "ST", "PW", "U01", "U02",
    ]
    .iter()
    .map(|visit| (*visit).to_string())
    .collect()
}

// imaging sessions share the visit code vocabulary
fn default_sessions() -> Vec<String> {
    default_visits()
}

fn default_volume_overrides() -> Vec<VolumeCountOverride> {
    vec![VolumeCountOverride {
        description: "T1".to_string(),
        modality: "DTI".to_string(),
        file_counts: vec![133, 184],
        plane: default_override_plane(),
        dims: default_override_dims(),
    }]
}

impl CurationConfig {
    /// Loads a config file. Validate separately, after resolving
    /// relative paths against the dataset root.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CurationError::MissingFile(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let config: CurationConfig = serde_json::from_str(&raw)
            .map_err(|err| CurationError::InvalidConfig(format!("{}: {err}", path.display())))?;
        Ok(config)
    }

    /// Joins every relative file path onto the dataset root.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |filepath: &mut PathBuf| {
            if filepath.is_relative() {
                *filepath = base.join(&*filepath);
            }
        };
        for spec in self
            .demographics
            .values_mut()
            .chain(self.assessments.values_mut())
        {
            resolve(&mut spec.filepath);
        }
        resolve(&mut self.imaging_info.filepath);
        if let Some(spec) = &mut self.image_descriptions {
            resolve(&mut spec.filepath);
        }
    }

    /// Checks that every referenced input file exists.
    pub fn validate(&self) -> Result<()> {
        for spec in self.demographics.values().chain(self.assessments.values()) {
            if !spec.filepath.is_file() {
                return Err(CurationError::MissingFile(spec.filepath.clone()));
            }
        }
        if !self.imaging_info.filepath.is_file() {
            return Err(CurationError::MissingFile(self.imaging_info.filepath.clone()));
        }
        Ok(())
    }

    /// All tabular sources, demographics first, in name order.
    pub fn tabular_sources(&self) -> impl Iterator<Item = (&String, &TabularFileSpec)> {
        self.demographics.iter().chain(self.assessments.iter())
    }
}
