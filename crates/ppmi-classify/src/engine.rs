//! The description classifier.
//!
//! Works over the imaging inventory one target at a time, in a fixed
//! priority order: dwi, func, then the anatomical suffixes with each
//! later suffix excluding the descriptions already claimed by earlier
//! ones. The anatomical ordering is what keeps a "T2 FLAIR" series out
//! of the T2w bucket.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use ppmi_ingest::column_values;
use ppmi_model::category::AnatSuffix;
use ppmi_model::columns::{
    COL_DESCRIPTION_IMAGING, COL_MODALITY_IMAGING, COL_PROTOCOL_IMAGING,
};
use ppmi_model::rules::DatatypeRule;
use ppmi_model::{AdvisoryKind, AdvisoryLog, Datatype};

use crate::description_map::DescriptionMap;
use crate::rules;

/// One inventory row, reduced to the fields classification reads.
#[derive(Debug, Clone)]
struct SeriesRow {
    modality: String,
    description: String,
    protocol: String,
}

fn series_rows(df: &DataFrame) -> Result<Vec<SeriesRow>> {
    let modalities = column_values(df, COL_MODALITY_IMAGING)?;
    let descriptions = column_values(df, COL_DESCRIPTION_IMAGING)?;
    let protocols = column_values(df, COL_PROTOCOL_IMAGING)?;
    Ok(modalities
        .into_iter()
        .zip(descriptions)
        .zip(protocols)
        .map(|((modality, description), protocol)| SeriesRow {
            modality,
            description,
            protocol,
        })
        .collect())
}

/// Runs the per-target filter pipeline and returns the sorted accepted
/// descriptions for that target.
fn filter_descriptions(
    rows: &[SeriesRow],
    target_label: &str,
    modality_tag: &str,
    rule: &DatatypeRule,
    extra_exclude_in: &[String],
    advisories: &mut AdvisoryLog,
) -> Vec<String> {
    // protocol filters drop rows outright; they are never considered
    // out-of-modality candidates either
    let rows: Vec<&SeriesRow> = rows
        .iter()
        .filter(|row| rule.protocol_allows(&row.protocol))
        .collect();

    // within-modality pool with per-description counts
    let mut pool: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.modality == modality_tag) {
        *pool.entry(row.description.as_str()).or_default() += 1;
    }
    info!(
        target = target_label,
        descriptions = pool.len(),
        "unique description strings for modality {modality_tag}"
    );

    // exact within-modality exclusions, including lists inherited from
    // higher-priority targets
    pool.retain(|description, _| {
        !rule.exclude_in.iter().any(|ex| ex == description)
            && !extra_exclude_in.iter().any(|ex| ex == description)
    });
    debug!(
        target = target_label,
        descriptions = pool.len(),
        "after exact exclusions"
    );

    // substring rejection, with the exception list rescuing entries
    if !rule.reject_substrings.is_empty() {
        let rescued: BTreeSet<&str> = pool
            .keys()
            .copied()
            .filter(|description| rule.matches_reject_exception(description))
            .collect();
        pool.retain(|description, _| {
            rescued.contains(description) || !rule.matches_reject(description)
        });
        debug!(
            target = target_label,
            descriptions = pool.len(),
            "after substring rejection"
        );
    }

    // advisory: accepted descriptions with none of the common substrings
    let suspicious: Vec<(&str, usize)> = pool
        .iter()
        .filter(|(description, _)| !rule.matches_common(description))
        .map(|(description, count)| (*description, *count))
        .collect();
    if !suspicious.is_empty() {
        let msg = format!(
            "{} of {} {target_label} descriptions contain no common substring: {:?}",
            suspicious.len(),
            pool.len(),
            suspicious
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::SuspiciousDescription, msg);
    }

    // out-of-modality pass
    let others: Vec<&&SeriesRow> = rows
        .iter()
        .filter(|row| row.modality != modality_tag)
        .filter(|row| !rule.exclude_out.iter().any(|ex| ex == &row.description))
        .collect();

    let mut shared: BTreeMap<&str, usize> = BTreeMap::new();
    let mut additions: BTreeMap<&str, usize> = BTreeMap::new();
    for row in others {
        if pool.contains_key(row.description.as_str()) {
            *shared.entry(row.description.as_str()).or_default() += 1;
        } else if rule.matches_common(&row.description) {
            *additions.entry(row.description.as_str()).or_default() += 1;
        }
    }
    if !shared.is_empty() {
        let msg = format!(
            "{} {target_label} description(s) also appear under other modalities: {:?}",
            shared.len(),
            shared
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::CrossModalityDuplicate, msg);
    }
    if !additions.is_empty() {
        let msg = format!(
            "{} new {target_label} description(s) found in other modalities: {:?}",
            additions.len(),
            additions
        );
        warn!("{msg}");
        advisories.push(AdvisoryKind::CrossModalityDuplicate, msg);
    }

    // sorted union of the within-modality pool and the recovered additions
    let mut accepted: BTreeSet<&str> = pool.keys().copied().collect();
    accepted.extend(additions.keys().copied());
    accepted.into_iter().map(str::to_string).collect()
}

/// Classifies every description in the inventory.
pub fn classify_inventory(df: &DataFrame) -> Result<(DescriptionMap, AdvisoryLog)> {
    let rows = series_rows(df)?;
    let mut advisories = AdvisoryLog::new();
    let mut map = DescriptionMap::default();

    info!("========== DWI ==========");
    map.dwi = filter_descriptions(
        &rows,
        "dwi",
        Datatype::Dwi.modality_tag(),
        &rules::rule_dwi(),
        &[],
        &mut advisories,
    );

    info!("========== FUNC ==========");
    map.func = filter_descriptions(
        &rows,
        "func",
        Datatype::Func.modality_tag(),
        &rules::rule_func(),
        &[],
        &mut advisories,
    );

    // anatomical suffixes chain their exclusions: each target also
    // excludes everything a higher-priority suffix already accepted
    let anat_tag = Datatype::Anat.modality_tag();

    info!("========== ANAT (T1w) ==========");
    let t1w = filter_descriptions(
        &rows,
        "anat/T1w",
        anat_tag,
        &rules::rule_anat(AnatSuffix::T1w),
        &rules::exclude_in_anat_t1(),
        &mut advisories,
    );

    info!("========== ANAT (T2w) ==========");
    let mut exclude = rules::exclude_in_anat();
    exclude.extend(t1w.iter().cloned());
    let t2w = filter_descriptions(
        &rows,
        "anat/T2w",
        anat_tag,
        &rules::rule_anat(AnatSuffix::T2w),
        &exclude,
        &mut advisories,
    );

    info!("========== ANAT (T2starw) ==========");
    let mut exclude = rules::exclude_in_anat();
    exclude.extend(t1w.iter().cloned());
    exclude.extend(t2w.iter().cloned());
    let t2starw = filter_descriptions(
        &rows,
        "anat/T2starw",
        anat_tag,
        &rules::rule_anat(AnatSuffix::T2starw),
        &exclude,
        &mut advisories,
    );

    info!("========== ANAT (FLAIR) ==========");
    let mut exclude = rules::exclude_in_anat();
    exclude.extend(t1w.iter().cloned());
    exclude.extend(t2w.iter().cloned());
    let flair = filter_descriptions(
        &rows,
        "anat/FLAIR",
        anat_tag,
        &rules::rule_anat(AnatSuffix::Flair),
        &exclude,
        &mut advisories,
    );

    map.anat.set_suffix(AnatSuffix::T1w, t1w);
    map.anat.set_suffix(AnatSuffix::T2w, t2w);
    map.anat.set_suffix(AnatSuffix::T2starw, t2starw);
    map.anat.set_suffix(AnatSuffix::Flair, flair);

    Ok((map, advisories))
}

/// Unique inventory descriptions assigned to no datatype, sorted.
pub fn ignored_descriptions(df: &DataFrame, map: &DescriptionMap) -> Result<Vec<String>> {
    let assigned: BTreeSet<&String> = map.all_descriptions().into_iter().collect();
    let mut ignored: BTreeSet<String> = BTreeSet::new();
    for description in column_values(df, COL_DESCRIPTION_IMAGING)? {
        if !assigned.contains(&description) {
            ignored.insert(description);
        }
    }
    Ok(ignored.into_iter().collect())
}
