//! Dense feature matrix and label vector carried between the dataset and the backends

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use std::collections::HashSet;

/// Numeric input table used to fit or query a model.
///
/// Column names travel with the values so a fitted model can reject
/// prediction input whose schema differs from the one it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Create a matrix from column names and a row-major value array
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PredictorError::InvalidInput(format!(
                "{} column names for {} value columns",
                columns.len(),
                values.ncols()
            )));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(PredictorError::InvalidInput(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
        }

        Ok(Self { columns, values })
    }

    /// Build a matrix from row vectors
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = columns.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(PredictorError::InvalidInput(format!(
                "row {} has {} values, expected {}",
                idx,
                row.len(),
                n_cols
            )));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), n_cols), flat)?;
        Self::new(columns, values)
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Underlying values
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// True when there are no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy a subset of rows, in the order given
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows()) {
            return Err(PredictorError::InvalidInput(format!(
                "row index {} out of bounds for {} rows",
                bad,
                self.n_rows()
            )));
        }

        Ok(Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        })
    }

    /// Fail with [`PredictorError::InvalidInput`] if any cell is NaN or infinite
    pub fn ensure_finite(&self) -> Result<()> {
        for (row, values) in self.values.outer_iter().enumerate() {
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(PredictorError::InvalidInput(format!(
                    "non-numeric value in column '{}' at row {}",
                    self.columns[col], row
                )));
            }
        }
        Ok(())
    }
}

/// Target values aligned by row position with a [`FeatureMatrix`]
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVector {
    name: String,
    values: Array1<f64>,
}

impl LabelVector {
    pub fn new(name: impl Into<String>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Name of the label column
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy a subset of labels, in the order given
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(PredictorError::InvalidInput(format!(
                "label index {} out of bounds for {} labels",
                bad,
                self.len()
            )));
        }

        Ok(Self {
            name: self.name.clone(),
            values: self.values.select(Axis(0), indices),
        })
    }

    pub fn ensure_finite(&self) -> Result<()> {
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(row) => Err(PredictorError::InvalidInput(format!(
                "non-numeric label '{}' at row {}",
                self.name, row
            ))),
            None => Ok(()),
        }
    }
}
