//! Decision tree implementation

use super::check_training_inputs;
use crate::error::{FraudGuardError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the weighted share of positive samples
    Leaf { proba: f64, n_samples: usize },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    fn proba(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { proba, .. } => return *proba,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Binary CART classifier using weighted Gini impurity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at each split, all when `None`
    pub max_features: Option<usize>,
    /// Seed for per-split feature sampling
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted class totals of a node
#[derive(Debug, Clone, Copy, Default)]
struct NodeStats {
    weight: f64,
    positive: f64,
}

impl NodeStats {
    fn proba(&self) -> f64 {
        if self.weight > 0.0 {
            self.positive / self.weight
        } else {
            0.0
        }
    }

    fn gini(&self) -> f64 {
        let p = self.proba();
        2.0 * p * (1.0 - p)
    }
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit with unit sample weights
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let weights = Array1::ones(y.len());
        self.fit_weighted(x, y, &weights)
    }

    /// Fit the tree with per-sample weights
    pub fn fit_weighted(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample_weight: &Array1<f64>,
    ) -> Result<&mut Self> {
        check_training_inputs(x, y)?;
        if sample_weight.len() != y.len() {
            return Err(FraudGuardError::ShapeError {
                expected: format!("sample_weight length = {}", y.len()),
                actual: format!("sample_weight length = {}", sample_weight.len()),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(FraudGuardError::invalid_parameter(
                "min_samples_leaf",
                0,
                "must be at least 1",
            ));
        }

        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; self.n_features];

        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.build_tree(x, y, sample_weight, indices, 0, &mut rng, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        self.root = Some(root);
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let stats = indices.iter().fold(NodeStats::default(), |mut acc, &i| {
            acc.weight += w[i];
            acc.positive += w[i] * y[i];
            acc
        });
        let impurity = stats.gini();

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || impurity <= 0.0;

        if should_stop {
            return TreeNode::Leaf {
                proba: stats.proba(),
                n_samples,
            };
        }

        let features = self.sample_features(rng);
        let best = match self.find_best_split(x, y, w, &indices, &features, stats) {
            Some(best) => best,
            None => {
                return TreeNode::Leaf {
                    proba: stats.proba(),
                    n_samples,
                }
            }
        };

        importances[best.feature_idx] += stats.weight * best.gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, best.feature_idx]] <= best.threshold);

        let left = self.build_tree(x, y, w, left_idx, depth + 1, rng, importances);
        let right = self.build_tree(x, y, w, right_idx, depth + 1, rng, importances);

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
            n_samples,
            impurity,
        }
    }

    fn sample_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut picked = index::sample(rng, self.n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Scan the candidate features in parallel with a sorted sweep each
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent: NodeStats,
    ) -> Option<SplitCandidate> {
        let parent_impurity = parent.gini();
        let min_leaf = self.min_samples_leaf;
        let n = indices.len();

        let candidates: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut rows: Vec<(f64, f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i], w[i]))
                    .collect();
                rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut left = NodeStats::default();
                let mut best: Option<SplitCandidate> = None;

                for i in 0..n - 1 {
                    let (xi, yi, wi) = rows[i];
                    left.weight += wi;
                    left.positive += wi * yi;

                    let next = rows[i + 1].0;
                    if xi >= next {
                        continue;
                    }
                    let n_left = i + 1;
                    if n_left < min_leaf || n - n_left < min_leaf {
                        continue;
                    }

                    let right = NodeStats {
                        weight: parent.weight - left.weight,
                        positive: parent.positive - left.positive,
                    };
                    if parent.weight <= 0.0 {
                        continue;
                    }
                    let child_impurity = (left.weight * left.gini() + right.weight * right.gini())
                        / parent.weight;
                    let gain = parent_impurity - child_impurity;

                    if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                        let mid = xi + (next - xi) / 2.0;
                        let threshold = if mid < next { mid } else { xi };
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        candidates
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }

    /// Probability of the positive class per row
    pub fn predict_positive(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(FraudGuardError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(FraudGuardError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| root.proba(row)).collect())
    }

    /// Class probabilities, columns ordered as classes 0 and 1
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let positive = self.predict_positive(x)?;
        let mut out = Array2::zeros((positive.len(), 2));
        for (i, p) in positive.iter().enumerate() {
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = *p;
        }
        Ok(out)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_positive(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Normalized weighted impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), Some(1));
        let points = array![[6.4], [6.6]];
        assert_eq!(tree.predict(&points).unwrap().to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(Some(1));
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth().unwrap() <= 1);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 0.0, 0.0, 0.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert!((proba[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let imp = tree.feature_importances().unwrap();
        assert!((imp[0] - 1.0).abs() < 1e-12);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn test_weights_shift_leaf_probability() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![0.0, 0.0, 1.0];
        let w = array![1.0, 1.0, 2.0];

        let mut tree = DecisionTree::new();
        tree.fit_weighted(&x, &y, &w).unwrap();
        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert!((proba[[0, 1]] - 0.5).abs() < 1e-12);
        assert!((proba.row(0).sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(FraudGuardError::ModelNotFitted)
        ));
    }
}
