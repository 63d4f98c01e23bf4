//! Model training module
//!
//! Two interchangeable regression backends behind one contract:
//! - Ordinary least squares ([`LinearRegression`])
//! - Bagged regression trees ([`RandomForest`])
//!
//! plus hold-out evaluation of either.

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod evaluation;
pub mod linear_models;
pub mod random_forest;

pub use config::{ModelType, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{Backend, FittedModel, TrainedModel};
pub use evaluation::{evaluate, train_test_split, Evaluation, TrainTestSplit};
pub use linear_models::LinearRegression;
pub use models::{ModelMetrics, Regressor};
pub use random_forest::{MaxFeatures, RandomForest};
