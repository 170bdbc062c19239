//! Output-file discipline for curated tabular artifacts.
//!
//! Every write goes through a change check: identical content is left
//! alone, and a changed file is first copied into a timestamped backup
//! so no curation run ever destroys a previous state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use polars::prelude::DataFrame;
use tracing::info;

use crate::csv_table::{frame_to_csv_string, write_frame_csv};

/// Default backups directory name, next to the output file.
pub const DNAME_BACKUPS: &str = ".backups";

fn backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(DNAME_BACKUPS).join(format!("{stem}-{stamp}{ext}"))
}

/// Writes a frame to `path` unless the rendered content is unchanged.
///
/// Returns `true` when the file was (re)written. A pre-existing file
/// with different content is copied into the backups directory first.
pub fn save_frame_with_backup(df: &DataFrame, path: &Path, dry_run: bool) -> Result<bool> {
    let rendered = frame_to_csv_string(df)?;

    if path.is_file() {
        let existing = fs::read_to_string(path)
            .with_context(|| format!("read existing output: {}", path.display()))?;
        if existing == rendered {
            info!(path = %path.display(), "output unchanged, not rewriting");
            return Ok(false);
        }
        let backup = backup_path(path);
        if !dry_run {
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create backups dir: {}", parent.display()))?;
            }
            fs::copy(path, &backup)
                .with_context(|| format!("back up {} to {}", path.display(), backup.display()))?;
        }
        info!(backup = %backup.display(), "backed up previous output");
    }

    if dry_run {
        info!(path = %path.display(), "dry run, not writing");
        return Ok(true);
    }
    write_frame_csv(df, path)?;
    info!(path = %path.display(), rows = df.height(), "wrote output");
    Ok(true)
}
