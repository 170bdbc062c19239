use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use ppmi_classify::{DescriptionMap, classify_inventory, ignored_descriptions};
use ppmi_heuristic::{HeuristicContext, read_dicominfo};
use ppmi_ingest::{
    load_imaging_inventory, save_frame_with_backup, string_frame, write_frame_csv,
};
use ppmi_manifest::{
    attach_cohorts, build_manifest, imaging_availability, load_cohort_table, load_manifest,
    reconcile_manifest,
};
use ppmi_model::columns::COL_DESCRIPTION_IMAGING;
use ppmi_model::{AdvisoryLog, CurationConfig, CurationError, TabularFileSpec};
use ppmi_tabular::{build_bagel, dashboard_bagel, load_tabular_info, tabular_info_and_merge};

use crate::cli::{
    CheckHeuristicArgs, DatasetArgs, FilterDescriptionsArgs, GenerateManifestArgs, TrackBagelArgs,
};
use crate::types::{
    BagelOutcome, FilterOutcome, HeuristicOutcome, HeuristicReport, ManifestOutcome,
};

const COHORT_SOURCE: &str = "COHORT_DEFINITION";

pub fn run_filter_descriptions(args: &FilterDescriptionsArgs) -> Result<FilterOutcome> {
    let span = info_span!("filter-descriptions");
    let _guard = span.enter();
    let root = &args.dataset.dataset_root;
    let config = load_config(&args.dataset)?;

    let inventory = load_imaging_inventory(&config.imaging_info.filepath)?;
    info!(rows = inventory.height(), "loaded imaging inventory");

    let (map, advisories) = classify_inventory(&inventory)?;
    let ignored = ignored_descriptions(&inventory, &map)?;

    let map_path = args
        .map
        .clone()
        .unwrap_or_else(|| description_map_path(&config, root));
    let ignored_path = args
        .ignored
        .clone()
        .unwrap_or_else(|| root.join("ignored_descriptions.csv"));

    let wrote = !args.dry_run;
    if wrote {
        for path in [&map_path, &ignored_path] {
            if path.exists() && !args.overwrite {
                bail!(CurationError::OutputExists(path.clone()));
            }
        }
        map.save(&map_path)?;
        let frame = string_frame(vec![(COL_DESCRIPTION_IMAGING, ignored.clone())])?;
        write_frame_csv(&frame, &ignored_path)?;
        info!(path = %map_path.display(), "wrote description map");
    }

    Ok(FilterOutcome {
        anat_count: map.anat.all().len(),
        dwi_count: map.dwi.len(),
        func_count: map.func.len(),
        ignored_count: ignored.len(),
        map_path,
        ignored_path,
        advisories,
        wrote,
    })
}

pub fn run_generate_manifest(args: &GenerateManifestArgs) -> Result<ManifestOutcome> {
    let span = info_span!("generate-manifest");
    let _guard = span.enter();
    let root = &args.dataset.dataset_root;
    let config = load_config(&args.dataset)?;
    let mut advisories = AdvisoryLog::new();

    let map_path = args
        .map
        .clone()
        .unwrap_or_else(|| description_map_path(&config, root));
    let map = DescriptionMap::load(&map_path)?;

    let inventory = load_imaging_inventory(&config.imaging_info.filepath)?;
    info!(rows = inventory.height(), "loaded imaging inventory");

    let sources = combined_sources(&config)?;
    let info = load_tabular_info(&sources, root, &config.visits, &mut advisories)?;
    let nonstatic = info
        .nonstatic_df
        .ok_or(CurationError::NoLongitudinalSource)?;

    let cohort_spec = config.demographics.get(COHORT_SOURCE).ok_or_else(|| {
        CurationError::InvalidConfig(format!(
            "demographics must configure a {COHORT_SOURCE} source"
        ))
    })?;
    let cohorts = load_cohort_table(&cohort_spec.filepath)?;
    let nonstatic = attach_cohorts(&nonstatic, &cohorts, &inventory, &mut advisories)?;

    let imaging = imaging_availability(&inventory, &map, &config.sessions, &mut advisories)?;
    let rebuilt = build_manifest(&nonstatic, &imaging, &mut advisories)?;

    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| root.join("manifest.csv"));
    let old = if manifest_path.is_file() {
        Some(load_manifest(&manifest_path)?)
    } else {
        None
    };
    let manifest = reconcile_manifest(&rebuilt, old.as_ref(), args.regenerate)?;
    let wrote = save_frame_with_backup(&manifest, &manifest_path, args.dry_run)?;

    Ok(ManifestOutcome {
        rows: manifest.height(),
        manifest_path,
        advisories,
        wrote,
    })
}

pub fn run_track_bagel(args: &TrackBagelArgs) -> Result<BagelOutcome> {
    let span = info_span!("track-bagel");
    let _guard = span.enter();
    let root = &args.dataset.dataset_root;
    let config = load_config(&args.dataset)?;
    let mut advisories = AdvisoryLog::new();

    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| root.join("manifest.csv"));
    if !manifest_path.is_file() {
        bail!(CurationError::MissingFile(manifest_path));
    }
    let manifest = load_manifest(&manifest_path)?;
    info!(rows = manifest.height(), "loaded manifest");

    let demographics = tabular_info_and_merge(
        &config.demographics,
        root,
        &config.visits,
        Some(&manifest),
        &mut advisories,
    )?;
    let assessments = tabular_info_and_merge(
        &config.assessments,
        root,
        &config.visits,
        Some(&manifest),
        &mut advisories,
    )?;

    let side_file = root.join("bagel_duplicates.csv");
    let bagel = build_bagel(&demographics, &assessments, &side_file)?;
    let dashboard = dashboard_bagel(&bagel)?;

    let bagel_path = args.bagel.clone().unwrap_or_else(|| root.join("bagel.csv"));
    let dashboard_path = args
        .dashboard
        .clone()
        .unwrap_or_else(|| root.join("dashboard_bagel.csv"));
    let wrote_bagel = save_frame_with_backup(&bagel, &bagel_path, args.dry_run)?;
    let wrote_dashboard = save_frame_with_backup(&dashboard, &dashboard_path, args.dry_run)?;

    Ok(BagelOutcome {
        bagel_rows: bagel.height(),
        dashboard_rows: dashboard.height(),
        bagel_path,
        dashboard_path,
        advisories,
        wrote_bagel,
        wrote_dashboard,
    })
}

pub fn run_check_heuristic(args: &CheckHeuristicArgs) -> Result<HeuristicOutcome> {
    let span = info_span!("check-heuristic");
    let _guard = span.enter();
    let root = &args.dataset.dataset_root;
    let config = load_config(&args.dataset)?;
    let mut advisories = AdvisoryLog::new();

    let map_path = args
        .map
        .clone()
        .unwrap_or_else(|| description_map_path(&config, root));
    let map = DescriptionMap::load(&map_path)?;

    let inventory = load_imaging_inventory(&config.imaging_info.filepath)?;
    let context = HeuristicContext::new(&inventory, map, &config.volume_count_overrides, true)?;

    let dicom_dir = args
        .dicom_info
        .clone()
        .unwrap_or_else(|| root.join("dicominfo"));
    let listings = listing_files(&dicom_dir)?;
    if listings.is_empty() {
        warn!(dir = %dicom_dir.display(), "no series listing files found");
    }

    let mut reports = Vec::with_capacity(listings.len());
    let mut has_errors = false;
    for path in listings {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let records = read_dicominfo(&path)?;
        let series_count = records.len();
        match context.evaluate(&records) {
            Ok((templates, log)) => {
                advisories.absorb(log);
                let templates = templates
                    .iter()
                    .map(|(key, series)| (key.template(), series.len()))
                    .collect();
                reports.push(HeuristicReport {
                    name,
                    series_count,
                    templates,
                    error: None,
                });
            }
            Err(error) => {
                has_errors = true;
                reports.push(HeuristicReport {
                    name,
                    series_count,
                    templates: Vec::new(),
                    error: Some(error.to_string()),
                });
            }
        }
    }

    Ok(HeuristicOutcome {
        reports,
        advisories,
        has_errors,
    })
}

/// Loads the curation config, resolves relative file paths against the
/// dataset root, and validates the resolved paths.
fn load_config(args: &DatasetArgs) -> Result<CurationConfig> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| args.dataset_root.join("curation_config.json"));
    let mut config = CurationConfig::from_file(&path)
        .with_context(|| format!("load curation config: {}", path.display()))?;
    config.resolve_paths(&args.dataset_root);
    config.validate()?;
    Ok(config)
}

fn description_map_path(config: &CurationConfig, root: &Path) -> PathBuf {
    config
        .image_descriptions
        .as_ref()
        .map(|spec| spec.filepath.clone())
        .unwrap_or_else(|| root.join("image_descriptions.json"))
}

/// Demographics and assessments merged into one source table; the
/// output column names must not collide across the two groups.
fn combined_sources(config: &CurationConfig) -> Result<BTreeMap<String, TabularFileSpec>> {
    let mut sources = BTreeMap::new();
    for (name, spec) in config.tabular_sources() {
        if sources.insert(name.clone(), spec.clone()).is_some() {
            bail!(CurationError::InvalidConfig(format!(
                "tabular column {name:?} is configured more than once"
            )));
        }
    }
    Ok(sources)
}

/// Series listing TSVs in the directory, sorted by file name.
fn listing_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!(CurationError::MissingFile(dir.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "tsv"))
        .collect();
    paths.sort();
    Ok(paths)
}
