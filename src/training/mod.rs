//! Model training
//!
//! Provides the estimators behind the pipeline factories and the training
//! run that ties loading, splitting, fitting and selection together:
//! - Logistic regression with L2 penalty
//! - CART decision trees with weighted Gini impurity
//! - Bootstrap random forests fit in parallel
//! - [`run_training`], the train / evaluate / select / persist loop

pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;
mod runner;

pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LogisticRegression;
pub use random_forest::RandomForest;
pub use runner::{run_training, ModelChoice, ModelFamily, TrainOptions, TrainingOutcome};

use crate::error::{FraudGuardError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-sample weighting by class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1
    #[default]
    Uniform,
    /// `n / (k * count_c)` over the full training set
    Balanced,
    /// `n / (k * count_c)` recomputed on each bootstrap sample
    BalancedSubsample,
}

impl ClassWeight {
    /// Sample weights for labels `y`.
    ///
    /// For [`ClassWeight::BalancedSubsample`] the caller passes the bootstrap
    /// labels, so both balanced variants compute the same thing here.
    pub fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        match self {
            ClassWeight::Uniform => Array1::ones(y.len()),
            ClassWeight::Balanced | ClassWeight::BalancedSubsample => balanced_sample_weights(y),
        }
    }
}

/// Weights `n / (k * count_c)` where `k` is the number of classes present
pub fn balanced_sample_weights(y: &Array1<f64>) -> Array1<f64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &v in y {
        *counts.entry(v.round() as i64).or_default() += 1;
    }

    let n = y.len() as f64;
    let k = counts.len() as f64;
    y.mapv(|v| {
        let count = counts.get(&(v.round() as i64)).copied().unwrap_or(1) as f64;
        n / (k * count)
    })
}

/// Reject empty inputs, length mismatches and labels outside {0, 1}
pub(crate) fn check_training_inputs(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(FraudGuardError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(FraudGuardError::TrainingError(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(FraudGuardError::TrainingError(format!(
            "labels must be 0 or 1, found {}",
            bad
        )));
    }
    Ok(())
}

/// Reject labels that hold a single class
pub(crate) fn check_both_classes(y: &Array1<f64>) -> Result<()> {
    let positives = y.iter().filter(|&&v| v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(FraudGuardError::TrainingError(format!(
            "training labels contain a single class ({}); both 0 and 1 are required",
            if positives == 0 { 0 } else { 1 }
        )));
    }
    Ok(())
}
