//! Row-oriented view over an all-string frame.

use anyhow::{Result, bail};
use polars::prelude::DataFrame;

use ppmi_ingest::{column_values, string_frame};

pub(crate) struct RowTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RowTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let headers: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        let columns: Vec<Vec<String>> = headers
            .iter()
            .map(|name| column_values(df, name))
            .collect::<Result<_>>()?;
        let mut rows = vec![Vec::with_capacity(headers.len()); df.height()];
        for column in &columns {
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value.clone());
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Vec<String>> =
            vec![Vec::with_capacity(self.rows.len()); self.headers.len()];
        for row in &self.rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value.clone());
            }
        }
        string_frame(
            self.headers
                .iter()
                .map(String::as_str)
                .zip(columns)
                .collect(),
        )
    }

    pub fn idx(&self, column: &str) -> Result<usize> {
        match self.headers.iter().position(|header| header == column) {
            Some(idx) => Ok(idx),
            None => bail!("column {column:?} missing from frame"),
        }
    }

    /// A blank row with the given cells filled in.
    pub fn blank_row(&self, cells: &[(usize, String)]) -> Vec<String> {
        let mut row = vec![String::new(); self.headers.len()];
        for (idx, value) in cells {
            row[*idx] = value.clone();
        }
        row
    }
}
