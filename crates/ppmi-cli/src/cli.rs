//! CLI argument definitions for the PPMI curation toolkit.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ppmi-curate",
    version,
    about = "PPMI curation toolkit - classify MRI series and build dataset tables",
    long_about = "Curate a PPMI dataset download.\n\n\
                  Classifies raw MRI series descriptions into BIDS datatypes, checks the\n\
                  BIDS-key heuristic against DICOM series listings, and reconciles tabular\n\
                  study data into manifest and bagel availability tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify inventory series descriptions into the description map.
    FilterDescriptions(FilterDescriptionsArgs),

    /// Build or extend the dataset manifest.
    GenerateManifest(GenerateManifestArgs),

    /// Aggregate tabular sources into the bagel availability tables.
    TrackBagel(TrackBagelArgs),

    /// Run the BIDS-key heuristic over DICOM series listings and report.
    CheckHeuristic(CheckHeuristicArgs),
}

#[derive(Parser)]
pub struct DatasetArgs {
    /// Dataset root; relative paths in the config resolve against it.
    #[arg(value_name = "DATASET_ROOT")]
    pub dataset_root: PathBuf,

    /// Curation config file (default: <DATASET_ROOT>/curation_config.json).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct FilterDescriptionsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output path for the description map JSON.
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Output path for the ignored-descriptions CSV.
    #[arg(long = "ignored", value_name = "PATH")]
    pub ignored: Option<PathBuf>,

    /// Replace existing output files.
    #[arg(long = "overwrite")]
    pub overwrite: bool,

    /// Compute everything but do not write any files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct GenerateManifestArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Description map JSON (default: from config, else
    /// <DATASET_ROOT>/image_descriptions.json).
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Manifest path (default: <DATASET_ROOT>/manifest.csv).
    #[arg(long = "manifest", value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Recompute existing manifest rows instead of only appending new
    /// subject/session pairs. Previously-seen pairs may still never
    /// disappear.
    #[arg(long = "regenerate")]
    pub regenerate: bool,

    /// Compute everything but do not write any files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct TrackBagelArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Manifest path (default: <DATASET_ROOT>/manifest.csv).
    #[arg(long = "manifest", value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Bagel output path (default: <DATASET_ROOT>/bagel.csv).
    #[arg(long = "bagel", value_name = "PATH")]
    pub bagel: Option<PathBuf>,

    /// Dashboard bagel output path (default:
    /// <DATASET_ROOT>/dashboard_bagel.csv).
    #[arg(long = "dashboard", value_name = "PATH")]
    pub dashboard: Option<PathBuf>,

    /// Compute everything but do not write any files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct CheckHeuristicArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Description map JSON (default: from config, else
    /// <DATASET_ROOT>/image_descriptions.json).
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Directory of per-subject DICOM series listing TSVs (default:
    /// <DATASET_ROOT>/dicominfo).
    #[arg(long = "dicom-info", value_name = "DIR")]
    pub dicom_info: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
