//! Training configuration

use super::random_forest::MaxFeatures;
use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regression backend variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Ordinary least squares
    LinearRegression,
    /// Bagged randomized regression trees
    RandomForest,
}

impl ModelType {
    /// All variants, in menu order
    pub const ALL: [ModelType; 2] = [ModelType::LinearRegression, ModelType::RandomForest];

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::LinearRegression => "Linear Regression",
            ModelType::RandomForest => "Random Forest",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelType::LinearRegression => "linear",
            ModelType::RandomForest => "random_forest",
        })
    }
}

impl FromStr for ModelType {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "linear_regression" | "ols" => Ok(ModelType::LinearRegression),
            "ensemble" | "random_forest" | "rf" | "forest" => Ok(ModelType::RandomForest),
            other => Err(PredictorError::Config(format!(
                "unknown model type '{}' (expected linear or random_forest)",
                other
            ))),
        }
    }
}

/// Configuration for model training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,

    /// Seed for bootstrap sampling, split feature sampling and hold-out shuffling
    pub random_state: u64,

    /// Maximum depth of trees (None = grow until leaves are pure)
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples per leaf
    pub min_samples_leaf: usize,

    /// Features considered at each split
    pub max_features: MaxFeatures,

    /// Whether the linear model fits an intercept
    pub fit_intercept: bool,

    /// Fraction of rows held out by `evaluate`
    pub test_size: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            fit_intercept: true,
            test_size: 0.2,
        }
    }
}

impl TrainingConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Check every parameter range, including the hold-out fraction
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PredictorError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        self.validate_model()
    }

    /// Check only the parameters that shape a fitted model
    pub fn validate_model(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PredictorError::Config("n_estimators must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(PredictorError::Config("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(PredictorError::Config("min_samples_leaf must be at least 1".into()));
        }
        if self.max_depth == Some(0) {
            return Err(PredictorError::Config("max_depth must be at least 1".into()));
        }
        match self.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(PredictorError::Config(
                format!("max_features fraction must be in (0, 1], got {}", f),
            )),
            MaxFeatures::Fixed(0) => Err(PredictorError::Config(
                "max_features must be at least 1".into(),
            )),
            _ => Ok(()),
        }
    }
}
