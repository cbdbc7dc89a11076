//! FraudGuard - transaction fraud scoring
//!
//! This crate provides the full path from raw transaction tables to a
//! scored verdict:
//! - Loading and stratified train/validation/test splitting
//! - Calendar feature derivation and column preprocessing
//! - Logistic regression and random forest pipelines with class balancing
//! - Evaluation, model selection and JSON persistence
//! - A prediction CLI and a small web form
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Raw table loading and stratified splitting
//! - [`features`] - Derived features and preprocessing plan construction
//! - [`preprocessing`] - Standard scaling and one-hot encoding
//!
//! ## Models
//! - [`training`] - Estimators and the training run
//! - [`models`] - Pipeline factories and the persisted pipeline
//! - [`evaluation`] - Metrics and reports
//! - [`inference`] - Single-transaction scoring
//!
//! ## Services
//! - [`server`] - Web form and JSON API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod data;
pub mod features;
pub mod preprocessing;

// Models
pub mod training;
pub mod models;
pub mod evaluation;
pub mod inference;

// Services
pub mod server;
pub mod cli;

pub use error::{FraudGuardError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{FraudGuardError, Result};

    // Data
    pub use crate::data::{load_raw_data, train_valid_test_split, DatasetSplit, SplitConfig};
    pub use crate::features::{add_basic_features, build_preprocessor, FeatureConfig};
    pub use crate::preprocessing::{ColumnPreprocessor, OneHotEncoder, StandardScaler};

    // Models
    pub use crate::models::{
        build_forest_model, build_logreg_model, Classifier, ForestParams, FraudPipeline,
        LogRegParams,
    };
    pub use crate::training::{run_training, ModelChoice, TrainOptions, TrainingOutcome};
    pub use crate::evaluation::{evaluate_model, EvaluationResult};

    // Inference
    pub use crate::inference::{load_model, score_transaction, Prediction, RiskLevel, TransactionInput};
}
