//! Student Grade Predictor
//!
//! Predicts a student's grade class from a table of student attributes with
//! one of two interchangeable regression backends: ordinary least squares or
//! a random forest. Both share a two-operation contract, `train` then
//! `predict`.
//!
//! # Modules
//!
//! - [`dataset`] - Validated student table, feature matrix and label vector
//! - [`training`] - Regression backends and hold-out evaluation
//! - [`cache`] - Fitted models keyed by backend and dataset fingerprint
//! - [`charts`] - Histograms and distributions for the terminal
//! - [`config`] - Application configuration
//! - [`cli`] - Command-line and interactive interface
//!
//! # Example
//!
//! ```no_run
//! use grade_predictor::prelude::*;
//!
//! let dataset = Dataset::load("data/dataset_procesado.csv", "StudentID", "GradeClass")?;
//! let (x, y) = dataset.split()?;
//!
//! let model = Backend::ensemble().train(&x, &y)?;
//! let student = dataset.student("1001")?;
//! let grade = model.predict(&student.features)?;
//! # Ok::<(), grade_predictor::PredictorError>(())
//! ```

pub mod error;

pub mod cache;
pub mod charts;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod training;
pub mod utils;

pub use error::{PredictorError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{PredictorError, Result};

    pub use crate::cache::{CacheKey, CacheStats, ModelCache};
    pub use crate::config::AppConfig;
    pub use crate::dataset::{Dataset, DatasetVersion, FeatureMatrix, LabelVector, StudentRecord};
    pub use crate::training::{
        evaluate, train_test_split, Backend, Evaluation, FittedModel, MaxFeatures, ModelMetrics,
        ModelType, TrainingConfig,
    };
}
