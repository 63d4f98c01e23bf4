//! Regression backend: the `train` / `predict` contract shared by both model variants

use super::config::{ModelType, TrainingConfig};
use super::linear_models::LinearRegression;
use super::models::Regressor;
use super::random_forest::RandomForest;
use crate::dataset::{FeatureMatrix, LabelVector};
use crate::error::{PredictorError, Result};
use ndarray::Array1;
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// Enum to hold trained model variants
#[derive(Debug, Clone)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    RandomForest(RandomForest),
}

impl TrainedModel {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
        }
    }
}

/// An immutable fitted model together with the schema it was trained on
#[derive(Debug, Clone)]
pub struct FittedModel {
    model_type: ModelType,
    schema: Vec<String>,
    label: String,
    n_samples: usize,
    training_time_secs: f64,
    model: TrainedModel,
}

impl FittedModel {
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Feature columns, in training order
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Name of the label the model predicts
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn training_time_secs(&self) -> f64 {
        self.training_time_secs
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// One prediction per row of `x_new`, in row order.
    ///
    /// Fails with [`PredictorError::SchemaMismatch`] unless `x_new` has
    /// exactly the training columns in the training order.
    pub fn predict(&self, x_new: &FeatureMatrix) -> Result<Array1<f64>> {
        if x_new.columns() != self.schema.as_slice() {
            return Err(PredictorError::SchemaMismatch {
                expected: self.schema.clone(),
                actual: x_new.columns().to_vec(),
            });
        }
        x_new.ensure_finite()?;

        if x_new.n_rows() == 0 {
            return Ok(Array1::zeros(0));
        }

        self.model.as_regressor().predict(x_new.values())
    }

    /// Feature importances paired with column names, most important first
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.model.as_regressor().feature_importances()?;
        let mut ranked: Vec<(String, f64)> = self
            .schema
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some(ranked)
    }
}

/// A regression backend: which variant to fit and with what parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Backend {
    model_type: ModelType,
    config: TrainingConfig,
}

impl Backend {
    pub fn new(model_type: ModelType, config: TrainingConfig) -> Self {
        Self { model_type, config }
    }

    /// Ordinary least squares with default configuration
    pub fn linear() -> Self {
        Self::new(ModelType::LinearRegression, TrainingConfig::default())
    }

    /// 100-tree random forest seeded with 42
    pub fn ensemble() -> Self {
        Self::new(ModelType::RandomForest, TrainingConfig::default())
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Canonical text of the parameters that shape this variant's fitted model.
    ///
    /// Backends with equal tags train identical models on identical data.
    pub fn params_tag(&self) -> String {
        let c = &self.config;
        let params = match self.model_type {
            ModelType::LinearRegression => json!({ "fit_intercept": c.fit_intercept }),
            ModelType::RandomForest => json!({
                "n_estimators": c.n_estimators,
                "random_state": c.random_state,
                "max_depth": c.max_depth,
                "min_samples_split": c.min_samples_split,
                "min_samples_leaf": c.min_samples_leaf,
                "max_features": c.max_features,
            }),
        };
        params.to_string()
    }

    /// Fit a fresh model on `(x, y)`.
    ///
    /// Fails with [`PredictorError::InvalidInput`] when `x` is empty, the
    /// row counts differ, or any value is not a finite number.
    pub fn train(&self, x: &FeatureMatrix, y: &LabelVector) -> Result<FittedModel> {
        self.config.validate_model()?;

        if x.is_empty() {
            return Err(PredictorError::InvalidInput(format!(
                "feature matrix is empty ({} rows x {} columns)",
                x.n_rows(),
                x.n_cols()
            )));
        }
        if x.n_rows() != y.len() {
            return Err(PredictorError::InvalidInput(format!(
                "feature matrix has {} rows but label vector has {}",
                x.n_rows(),
                y.len()
            )));
        }
        x.ensure_finite()?;
        y.ensure_finite()?;

        let start = Instant::now();
        let model = match self.model_type {
            ModelType::LinearRegression => {
                let mut model = LinearRegression::new().with_fit_intercept(self.config.fit_intercept);
                model.fit(x.values(), y.values())?;
                TrainedModel::LinearRegression(model)
            }
            ModelType::RandomForest => {
                let mut model = RandomForest::new(self.config.n_estimators)
                    .with_min_samples_split(self.config.min_samples_split)
                    .with_min_samples_leaf(self.config.min_samples_leaf)
                    .with_max_features(self.config.max_features)
                    .with_random_state(self.config.random_state);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x.values(), y.values())?;
                TrainedModel::RandomForest(model)
            }
        };
        let training_time_secs = start.elapsed().as_secs_f64();

        info!(
            model = %self.model_type,
            rows = x.n_rows(),
            features = x.n_cols(),
            elapsed_ms = training_time_secs * 1000.0,
            "Model trained"
        );

        Ok(FittedModel {
            model_type: self.model_type,
            schema: x.columns().to_vec(),
            label: y.name().to_string(),
            n_samples: x.n_rows(),
            training_time_secs,
            model,
        })
    }

    /// Predict with a model produced by any backend
    pub fn predict(&self, model: &FittedModel, x_new: &FeatureMatrix) -> Result<Array1<f64>> {
        model.predict(x_new)
    }
}
