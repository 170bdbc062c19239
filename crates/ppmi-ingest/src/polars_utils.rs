//! Polars helpers for the all-string frames used throughout the toolkit.
//!
//! Every frame in this workspace is built from string columns; numeric
//! interpretation happens at the point of use via the parse helpers.

use anyhow::{Result, bail};
use polars::prelude::*;

use ppmi_model::CurationError;

/// Builds a string-typed frame from (name, values) column pairs.
pub fn string_frame(pairs: Vec<(&str, Vec<String>)>) -> Result<DataFrame> {
    let columns: Vec<Column> = pairs
        .into_iter()
        .map(|(name, values)| Column::new(name.into(), values))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Converts a Polars AnyValue to its string representation.
/// Nulls become the empty string.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float64(v) => format_numeric(v),
        other => other.to_string(),
    }
}

/// Formats a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Parses a string as f64, treating blank as missing.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses a string as i64, treating blank as missing.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Reads one cell as a string. Out-of-range rows read as empty.
pub fn cell(df: &DataFrame, column: &str, row: usize) -> Result<String> {
    let series = df.column(column)?;
    let value = series.get(row).unwrap_or(AnyValue::Null);
    Ok(any_to_string(value))
}

/// Materializes a whole column as strings.
pub fn column_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df.column(column)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_string(series.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(values)
}

/// Fails with a typed error if any required column is absent.
pub fn require_columns(df: &DataFrame, path: &std::path::Path, columns: &[&str]) -> Result<()> {
    let names = df.get_column_names_str();
    for required in columns {
        if !names.iter().any(|name| name == required) {
            bail!(CurationError::MissingColumn {
                path: path.to_path_buf(),
                column: (*required).to_string(),
            });
        }
    }
    Ok(())
}

/// Filters a frame with a row-wise keep mask.
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Projects a frame onto the named columns, in order.
pub fn select_columns(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    Ok(df.select(columns.iter().map(|c| PlSmallStr::from(*c)))?)
}
