//! The heuristic evaluator: series metadata in, BIDS keys out.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use polars::prelude::DataFrame;
use tracing::warn;

use ppmi_classify::DescriptionMap;
use ppmi_ingest::column_values;
use ppmi_model::category::ImageCategory;
use ppmi_model::columns::{COL_IMAGE_ID, COL_MODALITY_IMAGING, COL_PROTOCOL_IMAGING};
use ppmi_model::{AdvisoryKind, AdvisoryLog, CurationError, VolumeCountOverride};

use crate::bids_key::BidsKey;
use crate::overrides::{
    RE_NEUROMELANIN, TAG_NEUROMELANIN, dwi_acq_from_description, dwi_dir_from_description,
    hardcoded_key,
};
use crate::protocol::{
    AcqDims, KEY_DIMS, KEY_PLANE, Plane, dims_from_description, parse_protocol_info,
    plane_from_description,
};
use crate::series::{SeriesRecord, image_id_from_dcm};

/// Per-image metadata pulled from the inventory.
#[derive(Debug, Clone)]
struct InventoryEntry {
    modality: String,
    protocol: String,
}

/// A volume-count override with its tags resolved.
#[derive(Debug, Clone)]
struct ResolvedOverride {
    description: String,
    modality: String,
    file_counts: Vec<usize>,
    plane: Plane,
    dims: AcqDims,
}

/// Evaluation result: template → appended series identifiers, in
/// append order (1-based run numbers follow this order).
pub type TemplateInfo = BTreeMap<BidsKey, Vec<String>>;

/// Everything the heuristic needs to resolve one series, held
/// explicitly so callers control construction and lifetime.
pub struct HeuristicContext {
    inventory: BTreeMap<String, InventoryEntry>,
    map: DescriptionMap,
    volume_overrides: Vec<ResolvedOverride>,
    /// Testing mode re-raises per-record failures; production logs
    /// and skips the record.
    testing: bool,
}

impl HeuristicContext {
    pub fn new(
        df_inventory: &DataFrame,
        map: DescriptionMap,
        volume_overrides: &[VolumeCountOverride],
        testing: bool,
    ) -> Result<Self> {
        let image_ids = column_values(df_inventory, COL_IMAGE_ID)?;
        let modalities = column_values(df_inventory, COL_MODALITY_IMAGING)?;
        let protocols = column_values(df_inventory, COL_PROTOCOL_IMAGING)?;

        let mut inventory = BTreeMap::new();
        for ((image_id, modality), protocol) in
            image_ids.into_iter().zip(modalities).zip(protocols)
        {
            inventory.insert(image_id, InventoryEntry { modality, protocol });
        }

        let mut resolved = Vec::with_capacity(volume_overrides.len());
        for entry in volume_overrides {
            let plane = Plane::from_tag(&entry.plane).ok_or_else(|| {
                CurationError::InvalidConfig(format!(
                    "unknown plane tag {:?} in volume-count override",
                    entry.plane
                ))
            })?;
            let dims = AcqDims::from_tag(&entry.dims).ok_or_else(|| {
                CurationError::InvalidConfig(format!(
                    "unknown dims tag {:?} in volume-count override",
                    entry.dims
                ))
            })?;
            resolved.push(ResolvedOverride {
                description: entry.description.clone(),
                modality: entry.modality.clone(),
                file_counts: entry.file_counts.clone(),
                plane,
                dims,
            });
        }

        Ok(Self {
            inventory,
            map,
            volume_overrides: resolved,
            testing,
        })
    }

    /// Assigns every series to a BIDS key.
    ///
    /// A filename without an image ID is fatal in either mode; all
    /// other per-record failures respect the testing flag.
    pub fn evaluate(&self, records: &[SeriesRecord]) -> Result<(TemplateInfo, AdvisoryLog)> {
        let mut info: TemplateInfo = BTreeMap::new();
        let mut advisories = AdvisoryLog::new();

        for record in records {
            let image_id = image_id_from_dcm(&record.example_dcm_file)?;

            // image IDs are stabler than series identifiers when
            // cross-checking against the archive
            let to_append = if self.testing {
                image_id.clone()
            } else {
                record.series_id.clone()
            };

            if let Some(key) = hardcoded_key(&image_id, &record.series_description) {
                info.entry(key).or_default().push(to_append);
                continue;
            }

            match self.resolve_record(record, &image_id) {
                Ok(key) => info.entry(key).or_default().push(to_append),
                Err(err) => {
                    let msg = format!("heuristic failed for image ID {image_id}: {err}");
                    if self.testing {
                        bail!(msg);
                    }
                    warn!("{msg}");
                    advisories.push(AdvisoryKind::HeuristicSkip, msg);
                }
            }
        }
        Ok((info, advisories))
    }

    fn resolve_record(&self, record: &SeriesRecord, image_id: &str) -> Result<BidsKey> {
        let description = record.series_description.trim();
        let Some(category) = self.map.category_of(description) else {
            bail!(CurationError::UnknownDescription(description.to_string()));
        };

        let Some(entry) = self.inventory.get(image_id) else {
            bail!(CurationError::UnknownImageId(image_id.to_string()));
        };
        let protocol_info = parse_protocol_info(image_id, &entry.protocol)?;

        match category {
            ImageCategory::Anatomical(suffix) => {
                if RE_NEUROMELANIN.is_match(description) {
                    return Ok(BidsKey::anat(suffix, None, None, Some(TAG_NEUROMELANIN)));
                }

                let mut dims = match protocol_info.get(KEY_DIMS) {
                    Some(value) => AcqDims::from_protocol(value),
                    None => None,
                };
                if dims.is_none() {
                    dims = dims_from_description(description)?;
                }

                let mut plane = match protocol_info.get(KEY_PLANE) {
                    Some(value) => Plane::from_protocol(value),
                    None => None,
                };
                if plane.is_none() {
                    plane = plane_from_description(description)?;
                }

                if dims.is_none() || plane.is_none() {
                    for entry_override in &self.volume_overrides {
                        if entry_override.description == description
                            && entry_override.modality == entry.modality
                            && entry_override.file_counts.contains(&record.series_files)
                        {
                            dims = Some(entry_override.dims);
                            plane = Some(entry_override.plane);
                            break;
                        }
                    }
                }

                Ok(BidsKey::anat(suffix, plane, dims, None))
            }
            ImageCategory::Diffusion => {
                let acq = dwi_acq_from_description(description);
                let dir = dwi_dir_from_description(description);
                Ok(BidsKey::dwi(acq, dir))
            }
            ImageCategory::Functional => {
                bail!("no output template is defined for functional series")
            }
        }
    }
}
