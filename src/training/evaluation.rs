//! Hold-out evaluation

use super::config::ModelType;
use super::engine::Backend;
use super::models::ModelMetrics;
use crate::dataset::{FeatureMatrix, LabelVector};
use crate::error::{PredictorError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle `0..n_samples` and hold out `ceil(n_samples * test_size)` rows.
///
/// At least one row lands on each side of the split.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if n_samples < 2 {
        return Err(PredictorError::InvalidInput(format!(
            "need at least 2 rows to split, got {}",
            n_samples
        )));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PredictorError::InvalidInput(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = ((n_samples as f64 * test_size).ceil() as usize).clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}

/// Hold-out report for one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub model_type: ModelType,
    pub n_train: usize,
    pub n_test: usize,
    pub metrics: ModelMetrics,
}

impl Evaluation {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Train on the split's training rows and score on its test rows
pub fn evaluate(
    backend: &Backend,
    x: &FeatureMatrix,
    y: &LabelVector,
    split: &TrainTestSplit,
) -> Result<Evaluation> {
    let x_train = x.select_rows(&split.train_indices)?;
    let y_train = y.select(&split.train_indices)?;
    let x_test = x.select_rows(&split.test_indices)?;
    let y_test = y.select(&split.test_indices)?;

    let model = backend.train(&x_train, &y_train)?;
    let predictions = model.predict(&x_test)?;

    let mut metrics = ModelMetrics::compute_regression(y_test.values(), &predictions);
    metrics.training_time_secs = model.training_time_secs();
    metrics.n_features = x.n_cols();

    debug!(
        model = %backend.model_type(),
        n_train = split.train_indices.len(),
        n_test = split.test_indices.len(),
        mse = ?metrics.mse,
        r2 = ?metrics.r2,
        "Evaluated hold-out split"
    );

    Ok(Evaluation {
        model_type: backend.model_type(),
        n_train: split.train_indices.len(),
        n_test: split.test_indices.len(),
        metrics,
    })
}
