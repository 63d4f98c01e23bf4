//! Chart data for the presentation layer
//!
//! Everything here is computed from an immutable [`Dataset`]; rendering lives
//! in [`render`].

pub mod labels;
pub mod render;

use crate::dataset::Dataset;
use crate::error::{PredictorError, Result};
use serde::Serialize;

pub use labels::display_label;

/// Bin count for the age histogram
pub const AGE_BINS: usize = 15;
/// Bin count for the label histogram
pub const LABEL_BINS: usize = 20;

/// One equal-width histogram bin; `upper` is exclusive except for the last bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bin `values` into `n_bins` equal-width bins spanning their range.
    ///
    /// A constant column collapses into a single bin.
    pub fn from_values(column: impl Into<String>, values: &[f64], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(PredictorError::InvalidInput("histogram needs at least one bin".into()));
        }
        let column = column.into();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidInput(format!(
                "column '{}' contains non-finite values",
                column
            )));
        }
        if values.is_empty() {
            return Ok(Self { column, bins: Vec::new() });
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max == min {
            return Ok(Self {
                column,
                bins: vec![Bin { lower: min, upper: max, count: values.len() }],
            });
        }

        let width = (max - min) / n_bins as f64;
        let mut bins: Vec<Bin> = (0..n_bins)
            .map(|i| Bin {
                lower: min + width * i as f64,
                upper: if i + 1 == n_bins { max } else { min + width * (i + 1) as f64 },
                count: 0,
            })
            .collect();

        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(n_bins - 1);
            bins[idx].count += 1;
        }

        Ok(Self { column, bins })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Count of rows per distinct value, ascending by value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub column: String,
    /// (display label, count)
    pub categories: Vec<(String, usize)>,
}

impl Distribution {
    pub fn from_values(column: impl Into<String>, values: &[f64]) -> Self {
        let column = column.into();

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut categories: Vec<(String, usize)> = Vec::new();
        let mut previous: Option<f64> = None;
        for v in sorted {
            match (previous, categories.last_mut()) {
                (Some(p), Some((_, count))) if p == v => *count += 1,
                _ => categories.push((display_label(&column, v), 1)),
            }
            previous = Some(v);
        }

        Self { column, categories }
    }

    pub fn max_count(&self) -> usize {
        self.categories.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }
}

/// Predicted against recorded label for one student
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub student_id: String,
    pub predicted: f64,
    pub actual: f64,
}

impl Comparison {
    pub fn error(&self) -> f64 {
        self.predicted - self.actual
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Histogram(Histogram),
    Distribution(Distribution),
}

impl Chart {
    pub fn column(&self) -> &str {
        match self {
            Chart::Histogram(h) => &h.column,
            Chart::Distribution(d) => &d.column,
        }
    }
}

/// The standard overview charts, for whichever of their columns the dataset has
pub fn overview_charts(dataset: &Dataset) -> Result<Vec<Chart>> {
    let mut charts = Vec::new();

    if dataset.has_column("Age") {
        let values = dataset.column_values("Age")?;
        charts.push(Chart::Histogram(Histogram::from_values("Age", &values, AGE_BINS)?));
    }
    for coded in ["Gender", "ParentalEducation"] {
        if dataset.has_column(coded) {
            let values = dataset.column_values(coded)?;
            charts.push(Chart::Distribution(Distribution::from_values(coded, &values)));
        }
    }

    let label = dataset.label_column();
    let values = dataset.column_values(label)?;
    charts.push(Chart::Histogram(Histogram::from_values(label, &values, LABEL_BINS)?));

    Ok(charts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_histogram_bins() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 4.0];
        let hist = Histogram::from_values("x", &values, 4).unwrap();

        assert_eq!(hist.bins.len(), 4);
        assert_eq!(hist.total(), 6);
        // The maximum lands in the last bin
        assert_eq!(hist.bins[3].count, 3);
        assert_eq!(hist.bins[0].lower, 0.0);
        assert_eq!(hist.bins[3].upper, 4.0);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let constant = Histogram::from_values("x", &[2.0, 2.0, 2.0], 10).unwrap();
        assert_eq!(constant.bins.len(), 1);
        assert_eq!(constant.bins[0].count, 3);

        let empty = Histogram::from_values("x", &[], 10).unwrap();
        assert!(empty.bins.is_empty());

        assert!(Histogram::from_values("x", &[1.0], 0).is_err());
        assert!(Histogram::from_values("x", &[f64::NAN], 3).is_err());
    }

    #[test]
    fn test_distribution_ordered_and_labelled() {
        let values = [3.0, 0.0, 1.0, 3.0, 4.0, 0.0, 3.0];
        let dist = Distribution::from_values("ParentalEducation", &values);

        let labels: Vec<&str> = dist.categories.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["0 - None", "1 - High School", "3 - Bachelor's", "4 - Higher"]);
        assert_eq!(dist.categories[2].1, 3);
        assert_eq!(dist.max_count(), 3);
    }

    #[test]
    fn test_distribution_unmapped_codes() {
        let dist = Distribution::from_values("Gender", &[0.0, 1.0, 2.0]);
        assert_eq!(dist.categories[2].0, "2");
    }

    #[test]
    fn test_overview_charts_follow_schema() {
        let df = df!(
            "StudentID" => &[1i64, 2, 3],
            "Age" => &[15i64, 16, 17],
            "Gender" => &[0i64, 1, 1],
            "GradeClass" => &[2.0, 1.0, 4.0]
        )
        .unwrap();
        let dataset = Dataset::from_frame(df, "StudentID", "GradeClass").unwrap();

        let charts = overview_charts(&dataset).unwrap();
        let columns: Vec<&str> = charts.iter().map(|c| c.column()).collect();
        assert_eq!(columns, vec!["Age", "Gender", "GradeClass"]);

        match &charts[0] {
            Chart::Histogram(h) => assert_eq!(h.bins.len(), AGE_BINS),
            other => panic!("expected histogram, got {:?}", other),
        }
    }
}
