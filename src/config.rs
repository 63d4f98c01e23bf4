//! Application configuration

use crate::error::{PredictorError, Result};
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings for the command-line application.
///
/// Every field is optional in the JSON file; absent fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Delimited student table
    pub data_path: PathBuf,
    pub id_column: String,
    pub label_column: String,
    /// Maximum number of fitted models kept in memory
    pub cache_capacity: usize,
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/dataset_procesado.csv"),
            id_column: "StudentID".to_string(),
            label_column: "GradeClass".to_string(),
            cache_capacity: 8,
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_column.is_empty() || self.label_column.is_empty() {
            return Err(PredictorError::Config(
                "identifier and label column names must not be empty".into(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(PredictorError::Config("cache_capacity must be at least 1".into()));
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/dataset_procesado.csv"));
        assert_eq!(config.id_column, "StudentID");
        assert_eq!(config.label_column, "GradeClass");
        assert_eq!(config.cache_capacity, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"label_column": "GPA", "training": {{"n_estimators": 10}}}}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.label_column, "GPA");
        assert_eq!(config.id_column, "StudentID");
        assert_eq!(config.training.n_estimators, 10);
        assert_eq!(config.training.random_state, 42);
    }

    #[test]
    fn test_load_errors() {
        let missing = AppConfig::load(Path::new("/nonexistent/grade-predictor.json"));
        assert!(matches!(missing, Err(PredictorError::Io(_))));

        let mut malformed = NamedTempFile::new().unwrap();
        write!(malformed, "{{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(malformed.path()),
            Err(PredictorError::Serialization(_))
        ));

        let mut invalid = NamedTempFile::new().unwrap();
        write!(invalid, r#"{{"cache_capacity": 0}}"#).unwrap();
        assert!(matches!(AppConfig::load(invalid.path()), Err(PredictorError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default()
            .with_data_path("other.tsv")
            .with_id_column("Id")
            .with_label_column("GPA");
        assert_eq!(config.data_path, PathBuf::from("other.tsv"));
        assert_eq!(config.id_column, "Id");
        assert_eq!(config.label_column, "GPA");
    }
}
