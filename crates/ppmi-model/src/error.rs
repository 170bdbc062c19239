use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that abort a curation run.
///
/// Per-record and advisory findings never surface here; they go through
/// the [`crate::AdvisoryLog`] channel or are logged and skipped by the
/// caller.
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("required input file not found: {0}")]
    MissingFile(PathBuf),
    #[error("missing required column {column:?} in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("found visit label without a mapping: {0:?}")]
    UnmappedVisit(String),
    #[error("found research group without a mapping: {0:?}")]
    UnmappedGroup(String),
    #[error("could not extract an image ID from {0:?}")]
    ImageIdParse(String),
    #[error("image ID {0} not present in the imaging inventory")]
    UnknownImageId(String),
    #[error("could not find a datatype for description {0:?}")]
    UnknownDescription(String),
    #[error("found multiple {kind} tags in description: {description}")]
    AmbiguousTag { kind: String, description: String },
    #[error("malformed protocol info entry {entry:?} for image {image_id}")]
    MalformedProtocolEntry { image_id: String, entry: String },
    #[error("at least one tabular source must carry both subject and visit columns")]
    NoLongitudinalSource,
    #[error(
        "{count} participant/session pairs in the existing manifest are missing \
         from the rebuilt one"
    )]
    ManifestRowsLost { count: usize },
    #[error("bagel has {count} duplicate participant/visit rows (offenders written to {side_file})")]
    DuplicateBagelRows { count: usize, side_file: PathBuf },
    #[error("output file exists: {0} (use --overwrite to replace it)")]
    OutputExists(PathBuf),
    #[error("invalid curation config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, CurationError>;
