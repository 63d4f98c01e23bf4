//! Validated student table

use super::matrix::{FeatureMatrix, LabelVector};
use crate::error::{PredictorError, Result};
use crate::utils::data_loader::DataLoader;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Content fingerprint of a dataset, used to key cached models
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetVersion(String);

impl DatasetVersion {
    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for display
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One student's feature row together with the recorded label
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: String,
    pub features: FeatureMatrix,
    pub label: f64,
}

/// An immutable student table keyed by a unique identifier column.
///
/// Construction validates that the identifier and label columns exist,
/// that identifiers are unique and non-null, and that the label is numeric.
/// Feature columns are everything else, in file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    id_column: String,
    label_column: String,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    version: DatasetVersion,
}

impl Dataset {
    /// Load and validate a delimited file
    pub fn load(path: impl AsRef<Path>, id_column: &str, label_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let frame = DataLoader::new().load_auto(path)?;
        let dataset = Self::from_frame(frame, id_column, label_column)?;

        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            features = dataset.feature_columns().len(),
            version = dataset.version.short(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    /// Validate an in-memory table
    pub fn from_frame(frame: DataFrame, id_column: &str, label_column: &str) -> Result<Self> {
        for required in [id_column, label_column] {
            if !has_column(&frame, required) {
                return Err(PredictorError::MissingColumn(required.to_string()));
            }
        }

        if id_column == label_column {
            return Err(PredictorError::InvalidInput(format!(
                "identifier and label must be different columns, both are '{}'",
                id_column
            )));
        }

        let ids = string_values(&frame, id_column)?;
        let mut index = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), row).is_some() {
                return Err(PredictorError::InvalidInput(format!(
                    "duplicate student identifier '{}' in column '{}'",
                    id, id_column
                )));
            }
        }

        // Label must be numeric and complete
        numeric_values(&frame, label_column)?;

        let version = fingerprint(&frame, id_column, label_column)?;

        Ok(Self {
            frame,
            id_column: id_column.to_string(),
            label_column: label_column.to_string(),
            ids,
            index,
            version,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn version(&self) -> &DatasetVersion {
        &self.version
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    /// Student identifiers in row order
    pub fn student_ids(&self) -> &[String] {
        &self.ids
    }

    /// Names of all columns that are neither identifier nor label
    pub fn feature_columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| *name != self.id_column && *name != self.label_column)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        has_column(&self.frame, name)
    }

    /// Numeric values of a single column, in row order
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        numeric_values(&self.frame, name)
    }

    /// Split into the feature matrix and label vector used for training
    pub fn split(&self) -> Result<(FeatureMatrix, LabelVector)> {
        let x = frame_to_matrix(&self.frame, self.feature_columns())?;
        let y = self.labels()?;
        Ok((x, y))
    }

    pub fn labels(&self) -> Result<LabelVector> {
        let values = numeric_values(&self.frame, &self.label_column)?;
        Ok(LabelVector::new(self.label_column.clone(), Array1::from_vec(values)))
    }

    fn row_of(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| PredictorError::StudentNotFound(id.to_string()))
    }

    /// Look up one student by identifier
    pub fn student(&self, id: &str) -> Result<StudentRecord> {
        let row = self.row_of(id)?;

        let slice = self.frame.slice(row as i64, 1);
        let features = frame_to_matrix(&slice, self.feature_columns())?;
        let label = numeric_values(&slice, &self.label_column)?
            .first()
            .copied()
            .ok_or_else(|| PredictorError::StudentNotFound(id.to_string()))?;

        Ok(StudentRecord {
            id: id.to_string(),
            features,
            label,
        })
    }

    /// Every cell of one student's row as text, paired with its column name, in file order
    pub fn student_row(&self, id: &str) -> Result<Vec<(String, String)>> {
        let row = self.row_of(id)?;
        let slice = self.frame.slice(row as i64, 1);

        slice
            .get_columns()
            .iter()
            .map(|column| -> Result<(String, String)> {
                let text = column.as_materialized_series().cast(&DataType::String)?;
                let value = text.str()?.get(0).unwrap_or("null").to_string();
                Ok((column.name().to_string(), value))
            })
            .collect()
    }
}

fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_names().iter().any(|c| c.as_str() == name)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn numeric_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = frame
        .column(name)
        .map_err(|_| PredictorError::MissingColumn(name.to_string()))?;

    if !is_numeric(column.dtype()) {
        return Err(PredictorError::InvalidInput(format!(
            "column '{}' is not numeric ({})",
            name,
            column.dtype()
        )));
    }

    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                PredictorError::InvalidInput(format!(
                    "column '{}' has a missing value at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = frame
        .column(name)
        .map_err(|_| PredictorError::MissingColumn(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;

    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                PredictorError::InvalidInput(format!(
                    "column '{}' has a missing identifier at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

/// Extract named columns into a row-major matrix
fn frame_to_matrix(frame: &DataFrame, columns: Vec<String>) -> Result<FeatureMatrix> {
    let col_data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| numeric_values(frame, name))
        .collect::<Result<_>>()?;

    let n_rows = frame.height();
    let values = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_data[c][r]);
    FeatureMatrix::new(columns, values)
}

/// Digest of the column roles and every cell, so the same table read with a
/// different label column gets a different version
fn fingerprint(frame: &DataFrame, id_column: &str, label_column: &str) -> Result<DatasetVersion> {
    let mut hasher = Sha256::new();

    for role in [id_column, label_column] {
        hasher.update(role.as_bytes());
        hasher.update([0x1d]);
    }

    for column in frame.get_columns() {
        hasher.update(column.name().as_str().as_bytes());
        hasher.update([0x1f]);

        let as_text = column.as_materialized_series().cast(&DataType::String)?;
        for value in as_text.str()?.into_iter() {
            match value {
                Some(v) => hasher.update(v.as_bytes()),
                None => hasher.update([0x00]),
            }
            hasher.update([0x1e]);
        }
    }

    Ok(DatasetVersion(format!("{:x}", hasher.finalize())))
}
