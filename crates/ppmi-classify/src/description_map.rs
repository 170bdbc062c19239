//! The datatype-descriptions artifact.
//!
//! Serialized as JSON with flat lists for `dwi`/`func` and a nested
//! suffix map under `anat`, which is the shape downstream conversion
//! tooling consumes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use ppmi_model::category::{AnatSuffix, Datatype, ImageCategory};
use ppmi_model::{AdvisoryKind, AdvisoryLog};

/// Per-suffix description lists for anatomical scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnatDescriptions {
    #[serde(rename = "T1w")]
    pub t1w: Vec<String>,
    #[serde(rename = "T2w")]
    pub t2w: Vec<String>,
    #[serde(rename = "T2starw")]
    pub t2starw: Vec<String>,
    #[serde(rename = "FLAIR")]
    pub flair: Vec<String>,
}

impl AnatDescriptions {
    pub fn for_suffix(&self, suffix: AnatSuffix) -> &[String] {
        match suffix {
            AnatSuffix::T1w => &self.t1w,
            AnatSuffix::T2w => &self.t2w,
            AnatSuffix::T2starw => &self.t2starw,
            AnatSuffix::Flair => &self.flair,
        }
    }

    pub fn set_suffix(&mut self, suffix: AnatSuffix, descriptions: Vec<String>) {
        match suffix {
            AnatSuffix::T1w => self.t1w = descriptions,
            AnatSuffix::T2w => self.t2w = descriptions,
            AnatSuffix::T2starw => self.t2starw = descriptions,
            AnatSuffix::Flair => self.flair = descriptions,
        }
    }

    /// All suffix lists flattened, in suffix priority order.
    pub fn all(&self) -> Vec<&String> {
        AnatSuffix::all()
            .iter()
            .flat_map(|suffix| self.for_suffix(*suffix).iter())
            .collect()
    }
}

/// Description lists for every datatype.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionMap {
    pub dwi: Vec<String>,
    pub func: Vec<String>,
    pub anat: AnatDescriptions,
}

impl DescriptionMap {
    /// All descriptions assigned to the given datatype.
    pub fn descriptions_for(&self, datatype: Datatype) -> Vec<&String> {
        match datatype {
            Datatype::Dwi => self.dwi.iter().collect(),
            Datatype::Func => self.func.iter().collect(),
            Datatype::Anat => self.anat.all(),
        }
    }

    /// Every assigned description, across all datatypes.
    pub fn all_descriptions(&self) -> Vec<&String> {
        let mut all = self.descriptions_for(Datatype::Anat);
        all.extend(self.descriptions_for(Datatype::Dwi));
        all.extend(self.descriptions_for(Datatype::Func));
        all
    }

    /// Builds the description → datatype reverse index.
    ///
    /// First-seen wins, scanning anat then dwi then func; a description
    /// listed under more than one datatype is an advisory, not an error.
    pub fn reverse_index(&self, advisories: &mut AdvisoryLog) -> BTreeMap<String, Datatype> {
        let mut index = BTreeMap::new();
        for datatype in [Datatype::Anat, Datatype::Dwi, Datatype::Func] {
            for description in self.descriptions_for(datatype) {
                if let Some(existing) = index.get(description.as_str()) {
                    let msg = format!(
                        "description {description:?} has more than one associated datatype, \
                         using {existing:?}"
                    );
                    warn!("{msg}");
                    advisories.push(AdvisoryKind::CrossModalityDuplicate, msg);
                } else {
                    index.insert(description.clone(), datatype);
                }
            }
        }
        index
    }

    /// Resolves a single description to its image category.
    ///
    /// Anatomical suffixes are checked first, in priority order, matching
    /// the precedence used by [`Self::reverse_index`].
    pub fn category_of(&self, description: &str) -> Option<ImageCategory> {
        for suffix in AnatSuffix::all() {
            if self
                .anat
                .for_suffix(suffix)
                .iter()
                .any(|entry| entry == description)
            {
                return Some(ImageCategory::Anatomical(suffix));
            }
        }
        if self.dwi.iter().any(|entry| entry == description) {
            return Some(ImageCategory::Diffusion);
        }
        if self.func.iter().any(|entry| entry == description) {
            return Some(ImageCategory::Functional);
        }
        None
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read description map: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse description map: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize description map")?;
        fs::write(path, json)
            .with_context(|| format!("write description map: {}", path.display()))?;
        Ok(())
    }
}
