//! Stratified train/validation/test splitting

use super::label_array;
use crate::error::{FraudGuardError, Result};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Split fractions and seed
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of all rows held out for testing
    pub test_size: f64,
    /// Fraction of the post-test remainder held out for validation
    pub valid_size: f64,
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            valid_size: 0.25,
            random_state: 42,
        }
    }
}

impl SplitConfig {
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_valid_size(mut self, valid_size: f64) -> Self {
        self.valid_size = valid_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Split `df` on `target_col` with these settings
    pub fn split(&self, df: &DataFrame, target_col: &str) -> Result<DatasetSplit> {
        train_valid_test_split(
            df,
            target_col,
            self.test_size,
            self.valid_size,
            self.random_state,
        )
    }
}

/// Three feature tables (label dropped) and their label vectors
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub x_train: DataFrame,
    pub x_valid: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Array1<f64>,
    pub y_valid: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl DatasetSplit {
    /// Row counts as `(train, valid, test)`
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.x_train.height(), self.x_valid.height(), self.x_test.height())
    }
}

/// Stratified three-way split.
///
/// `ceil(test_size * n)` rows go to the test part first, then
/// `ceil(valid_size * remainder)` rows of what is left go to validation, so
/// `test_size = 0.2, valid_size = 0.25` yields 20/20/60. The same seed always
/// reproduces the same rows in the same order.
pub fn train_valid_test_split(
    df: &DataFrame,
    target_col: &str,
    test_size: f64,
    valid_size: f64,
    random_state: u64,
) -> Result<DatasetSplit> {
    check_fraction("test_size", test_size)?;
    check_fraction("valid_size", valid_size)?;

    let labels = label_array(df, target_col)?;
    let labels = labels.to_vec();
    let n = labels.len();

    log_target_distribution(target_col, &labels);

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(FraudGuardError::invalid_parameter(
            "test_size",
            test_size,
            format!("leaves no rows for training out of {}", n),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    let all: Vec<usize> = (0..n).collect();
    let (rest, test_idx) = stratified_holdout(&labels, &all, n_test, &mut rng);

    let n_valid = (valid_size * rest.len() as f64).ceil() as usize;
    if n_valid == 0 || n_valid >= rest.len() {
        return Err(FraudGuardError::invalid_parameter(
            "valid_size",
            valid_size,
            format!("leaves no rows for training out of {}", rest.len()),
        ));
    }
    let (train_idx, valid_idx) = stratified_holdout(&labels, &rest, n_valid, &mut rng);

    let features = df.drop(target_col)?;
    let split = DatasetSplit {
        x_train: take_rows(&features, &train_idx)?,
        x_valid: take_rows(&features, &valid_idx)?,
        x_test: take_rows(&features, &test_idx)?,
        y_train: gather(&labels, &train_idx),
        y_valid: gather(&labels, &valid_idx),
        y_test: gather(&labels, &test_idx),
    };

    let (tr, va, te) = split.sizes();
    info!(train = tr, valid = va, test = te, "Split dataset");

    Ok(split)
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(FraudGuardError::invalid_parameter(
            name,
            value,
            "must be in (0, 1)",
        ));
    }
    Ok(())
}

/// Move `holdout_size` of `indices` into a holdout set, class by class.
///
/// Per-class quotas use largest-remainder allocation so the holdout mirrors
/// the class ratio of `indices`. Returns `(kept, holdout)`.
fn stratified_holdout(
    labels: &[f64],
    indices: &[usize],
    holdout_size: usize,
    rng: &mut ChaCha8Rng,
) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for &idx in indices {
        by_class
            .entry(labels[idx].round() as i64)
            .or_default()
            .push(idx);
    }

    let n = indices.len() as f64;
    let mut quotas: Vec<(i64, usize, f64)> = by_class
        .iter()
        .map(|(&class, members)| {
            let exact = members.len() as f64 * holdout_size as f64 / n;
            (class, exact.floor() as usize, exact - exact.floor())
        })
        .collect();

    let assigned: usize = quotas.iter().map(|(_, q, _)| q).sum();
    let mut leftover = holdout_size.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        quotas[b]
            .2
            .partial_cmp(&quotas[a].2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| by_class[&quotas[b].0].len().cmp(&by_class[&quotas[a].0].len()))
    });
    for i in order {
        if leftover == 0 {
            break;
        }
        let class_size = by_class[&quotas[i].0].len();
        if quotas[i].1 < class_size {
            quotas[i].1 += 1;
            leftover -= 1;
        }
    }

    let mut kept = Vec::with_capacity(indices.len() - holdout_size);
    let mut holdout = Vec::with_capacity(holdout_size);
    for (class, quota, _) in quotas {
        let mut members = by_class.remove(&class).unwrap_or_default();
        members.shuffle(rng);
        let rest = members.split_off(quota.min(members.len()));
        holdout.extend(members);
        kept.extend(rest);
    }

    // Interleave classes
    kept.shuffle(rng);
    holdout.shuffle(rng);
    (kept, holdout)
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

fn gather(labels: &[f64], indices: &[usize]) -> Array1<f64> {
    indices.iter().map(|&i| labels[i]).collect()
}

fn log_target_distribution(target_col: &str, labels: &[f64]) {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &v in labels {
        *counts.entry(v.round() as i64).or_default() += 1;
    }
    let total = labels.len().max(1) as f64;
    for (class, count) in counts {
        info!(
            column = target_col,
            class,
            count,
            share = %format!("{:.4}", count as f64 / total),
            "Target distribution"
        );
    }
}
