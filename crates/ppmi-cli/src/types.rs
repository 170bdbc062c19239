use std::path::PathBuf;

use ppmi_model::AdvisoryLog;

#[derive(Debug)]
pub struct FilterOutcome {
    pub map_path: PathBuf,
    pub ignored_path: PathBuf,
    pub anat_count: usize,
    pub dwi_count: usize,
    pub func_count: usize,
    pub ignored_count: usize,
    pub advisories: AdvisoryLog,
    pub wrote: bool,
}

#[derive(Debug)]
pub struct ManifestOutcome {
    pub manifest_path: PathBuf,
    pub rows: usize,
    pub advisories: AdvisoryLog,
    pub wrote: bool,
}

#[derive(Debug)]
pub struct BagelOutcome {
    pub bagel_path: PathBuf,
    pub dashboard_path: PathBuf,
    pub bagel_rows: usize,
    pub dashboard_rows: usize,
    pub advisories: AdvisoryLog,
    pub wrote_bagel: bool,
    pub wrote_dashboard: bool,
}

#[derive(Debug)]
pub struct HeuristicOutcome {
    pub reports: Vec<HeuristicReport>,
    pub advisories: AdvisoryLog,
    pub has_errors: bool,
}

/// Heuristic evaluation of one DICOM series listing file.
#[derive(Debug)]
pub struct HeuristicReport {
    pub name: String,
    pub series_count: usize,
    /// Template string and how many series landed on it.
    pub templates: Vec<(String, usize)>,
    pub error: Option<String>,
}
