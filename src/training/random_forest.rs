//! Random Forest implementation

use super::decision_tree::DecisionTree;
use super::{check_both_classes, check_training_inputs, ClassWeight};
use crate::error::{FraudGuardError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random forest of Gini trees for binary labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    pub class_weight: ClassWeight,
    /// Tree `i` is seeded with `random_state + i`
    pub random_state: u64,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

/// Features drawn at each split: floor of the square root, at least 1
fn sqrt_max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Uniform,
            random_state: 42,
            feature_importances: None,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the forest on bootstrap samples, building trees in parallel
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_inputs(x, y)?;
        check_both_classes(y)?;
        if self.n_estimators == 0 {
            return Err(FraudGuardError::invalid_parameter(
                "n_estimators",
                0,
                "must be at least 1",
            ));
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        let max_features = sqrt_max_features(self.n_features);
        let full_weights = match self.class_weight {
            ClassWeight::Balanced => Some(self.class_weight.sample_weights(y)),
            _ => None,
        };

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);
                let w_boot = match (&full_weights, self.class_weight) {
                    (Some(w), _) => w.select(Axis(0), &sample_indices),
                    (None, ClassWeight::BalancedSubsample) => {
                        self.class_weight.sample_weights(&y_boot)
                    }
                    (None, _) => Array1::ones(sample_indices.len()),
                };

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.max_depth)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(Some(max_features))
                    .with_random_state(rng.next_u64());
                tree.fit_weighted(&x_boot, &y_boot, &w_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        debug!(
            n_trees = self.trees.len(),
            max_features,
            mean_depth = self.mean_depth(),
            "Fitted random forest"
        );
        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (acc, &val) in total.iter_mut().zip(imp.iter()) {
                    *acc += val;
                }
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }
        self.feature_importances = Some(Array1::from_vec(total));
    }

    fn mean_depth(&self) -> f64 {
        let depths: Vec<usize> = self.trees.iter().filter_map(DecisionTree::depth).collect();
        depths.iter().sum::<usize>() as f64 / depths.len().max(1) as f64
    }

    /// Mean of the per-tree class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(FraudGuardError::ModelNotFitted);
        }

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_positive(x))
            .collect::<Result<Vec<_>>>()?;

        let mut positive = Array1::<f64>::zeros(x.nrows());
        for p in &per_tree {
            positive += p;
        }
        positive /= per_tree.len() as f64;

        let mut out = Array2::zeros((x.nrows(), 2));
        for (i, p) in positive.iter().enumerate() {
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = *p;
        }
        Ok(out)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(1).mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Mean decrease in impurity, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
