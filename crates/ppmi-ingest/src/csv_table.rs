//! CSV reading and writing for all-string frames.

use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use polars::prelude::*;

use ppmi_model::CurationError;

use crate::polars_utils::{any_to_string, string_frame};

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads a CSV file into an all-string frame.
///
/// Headers and cells are whitespace/BOM-normalized; short records are
/// padded with empty strings so ragged exports still load.
pub fn read_string_frame(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        bail!(CurationError::MissingFile(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read headers: {}", path.display()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        for (idx, column) in columns.iter_mut().enumerate() {
            let value = record.get(idx).unwrap_or("");
            column.push(normalize_cell(value));
        }
    }

    let pairs: Vec<(&str, Vec<String>)> = headers
        .iter()
        .map(String::as_str)
        .zip(columns)
        .collect();
    string_frame(pairs)
}

/// Writes a frame as CSV. Nulls are written as empty cells.
pub fn write_frame_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory: {}", parent.display()))?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("write csv: {}", path.display()))?;

    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    writer.write_record(&names)?;

    let series: Vec<&Column> = df.get_columns().iter().collect();
    for row in 0..df.height() {
        let record: Vec<String> = series
            .iter()
            .map(|column| any_to_string(column.get(row).unwrap_or(AnyValue::Null)))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders a frame as CSV text without touching the filesystem.
/// Used for change detection before rewriting an output file.
pub fn frame_to_csv_string(df: &DataFrame) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    writer.write_record(&names)?;
    let series: Vec<&Column> = df.get_columns().iter().collect();
    for row in 0..df.height() {
        let record: Vec<String> = series
            .iter()
            .map(|column| any_to_string(column.get(row).unwrap_or(AnyValue::Null)))
            .collect();
        writer.write_record(&record)?;
    }
    let bytes = writer.into_inner().context("flush csv buffer")?;
    Ok(String::from_utf8(bytes).context("csv output is not utf-8")?)
}
