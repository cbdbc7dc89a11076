//! Model factories
//!
//! Each factory wraps an unfitted [`ColumnPreprocessor`] and a classifier
//! with class-imbalance correction into a [`FraudPipeline`].

mod pipeline;

pub use pipeline::{Classifier, ClassifierKind, FraudPipeline, PipelineMetadata};

use crate::preprocessing::ColumnPreprocessor;
use crate::training::{ClassWeight, LogisticRegression, RandomForest};
use serde::{Deserialize, Serialize};

/// Seed shared by both factories
pub const RANDOM_STATE: u64 = 42;

/// Logistic regression hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRegParams {
    /// Inverse L2 regularization strength
    pub c: f64,
    pub max_iter: usize,
}

impl Default for LogRegParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
        }
    }
}

impl LogRegParams {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// Random forest hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Unbounded when `None`
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

impl ForestParams {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }
}

/// Logistic regression with balanced class weights
pub fn build_logreg_model(preprocessor: ColumnPreprocessor, params: &LogRegParams) -> FraudPipeline {
    let classifier = LogisticRegression::new()
        .with_c(params.c)
        .with_max_iter(params.max_iter)
        .with_class_weight(ClassWeight::Balanced)
        .with_random_state(RANDOM_STATE);

    FraudPipeline::new(preprocessor, ClassifierKind::LogisticRegression(classifier))
}

/// Random forest with per-bootstrap balanced class weights
pub fn build_forest_model(preprocessor: ColumnPreprocessor, params: &ForestParams) -> FraudPipeline {
    let classifier = RandomForest::new(params.n_estimators)
        .with_max_depth(params.max_depth)
        .with_min_samples_leaf(params.min_samples_leaf)
        .with_class_weight(ClassWeight::BalancedSubsample)
        .with_random_state(RANDOM_STATE);

    FraudPipeline::new(preprocessor, ClassifierKind::RandomForest(classifier))
}
