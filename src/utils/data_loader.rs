//! Data loading utilities

use crate::error::{PredictorError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rows polars samples to infer column types
const INFER_SCHEMA_ROWS: usize = 1000;

/// Loader for delimited student tables
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load a comma separated file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        self.load_csv_with_options(path, b',', true)
    }

    /// Load a delimited file with specific options
    pub fn load_csv_with_options(
        &self,
        path: &Path,
        delimiter: u8,
        has_header: bool,
    ) -> Result<DataFrame> {
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        CsvReadOptions::default()
            .with_has_header(has_header)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PredictorError::Data(format!("{}: {}", path.display(), e)))
    }

    /// Pick the delimiter from the extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        self.load_csv_with_options(path, delimiter_for(path), true)
    }

    /// Get file info without parsing the full table
    pub fn get_file_info(&self, path: &Path) -> Result<FileInfo> {
        let file_size = std::fs::metadata(path)?.len();

        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let separator = delimiter_for(path) as char;
        let columns: Vec<String> = header
            .split(separator)
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut n_rows = 0;
        for line in lines {
            if !line?.trim().is_empty() {
                n_rows += 1;
            }
        }

        Ok(FileInfo {
            path: path.display().to_string(),
            file_size,
            n_rows,
            n_cols: columns.len(),
            columns,
        })
    }
}

fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);

    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

/// File information
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub file_size: u64,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<String>,
}
