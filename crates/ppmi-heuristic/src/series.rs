//! DICOM sequence metadata records.
//!
//! One [`SeriesRecord`] per converted series, carrying the fields the
//! heuristic reads. Records come either from the converter's dicominfo
//! TSV files (check mode) or from the converter runtime itself.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use ppmi_model::CurationError;

static RE_IMAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*_I([0-9]+)\.dcm").unwrap());

/// One image series as seen at conversion time.
#[derive(Debug, Clone)]
pub struct SeriesRecord {
    pub series_id: String,
    pub series_description: String,
    /// Example DICOM filename; carries the archive image ID.
    pub example_dcm_file: String,
    /// Number of files in the series.
    pub series_files: usize,
}

/// Extracts the archive image ID from an example DICOM filename.
/// A filename that does not carry one is fatal for the record.
pub fn image_id_from_dcm(fname: &str) -> Result<String> {
    match RE_IMAGE_ID.captures(fname) {
        Some(captures) => Ok(captures[1].to_string()),
        None => bail!(CurationError::ImageIdParse(fname.to_string())),
    }
}

/// Loads series records from a heudiconv-style dicominfo TSV.
pub fn read_dicominfo(path: &Path) -> Result<Vec<SeriesRecord>> {
    if !path.is_file() {
        bail!(CurationError::MissingFile(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read dicominfo: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read headers: {}", path.display()))?
        .clone();
    let index_of = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            CurationError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            }
            .into()
        })
    };
    let idx_series_id = index_of("series_id")?;
    let idx_description = index_of("series_description")?;
    let idx_dcm = index_of("example_dcm_file")?;
    let idx_files = index_of("series_files")?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let series_files = field(idx_files).parse::<usize>().unwrap_or(0);
        records.push(SeriesRecord {
            series_id: field(idx_series_id),
            series_description: field(idx_description),
            example_dcm_file: field(idx_dcm),
            series_files,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_id_extraction() {
        assert_eq!(
            image_id_from_dcm("PPMI_3000_MR_MPRAGE_S123_I456789.dcm").unwrap(),
            "456789"
        );
    }

    #[test]
    fn filename_without_image_id_is_fatal() {
        let err = image_id_from_dcm("no-id-here.dcm").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CurationError>(),
            Some(CurationError::ImageIdParse(_))
        ));
    }

    #[test]
    fn dicominfo_tsv_loads_needed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicominfo_ses-1.tsv");
        std::fs::write(
            &path,
            "series_id\tseries_description\texample_dcm_file\tseries_files\n\
             2-MPRAGE\tMPRAGE GRAPPA\tPPMI_3000_MR_S1_I100.dcm\t176\n",
        )
        .unwrap();
        let records = read_dicominfo(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].series_description, "MPRAGE GRAPPA");
        assert_eq!(records[0].series_files, 176);
    }
}
