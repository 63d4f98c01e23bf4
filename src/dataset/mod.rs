//! Student dataset: loading, validation and the feature/label split

mod matrix;
mod table;

pub use matrix::{FeatureMatrix, LabelVector};
pub use table::{Dataset, DatasetVersion, StudentRecord};
