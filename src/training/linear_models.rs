//! Logistic regression

use super::{check_both_classes, check_training_inputs, ClassWeight};
use crate::error::{FraudGuardError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// L2-regularized logistic regression for binary labels.
///
/// Minimizes the weighted mean log-loss plus `||w||^2 / (2 * C * n)` by full
/// batch gradient descent. The step is halved whenever the loss would rise
/// and doubled, up to `learning_rate`, after each accepted update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Gradient-norm convergence tolerance
    pub tol: f64,
    /// Initial step size
    pub learning_rate: f64,
    pub class_weight: ClassWeight,
    /// Recorded for reproducibility; the solver itself is deterministic
    pub random_state: u64,
    /// Iterations run by the last fit
    pub n_iter: usize,
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            learning_rate: 1.0,
            class_weight: ClassWeight::Uniform,
            random_state: 42,
            n_iter: 0,
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
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

    /// Fit by gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_inputs(x, y)?;
        check_both_classes(y)?;
        if !(self.c > 0.0) {
            return Err(FraudGuardError::invalid_parameter("C", self.c, "must be positive"));
        }

        let n = x.nrows() as f64;
        let sw = self.class_weight.sample_weights(y);
        let inv_c = 1.0 / (self.c * n);

        let mut weights: Array1<f64> = Array1::zeros(x.ncols());
        let mut bias = 0.0;
        let mut lr = self.learning_rate;
        let mut loss = objective(x, y, &sw, &weights, bias, inv_c);
        let mut converged = false;
        self.n_iter = 0;

        for _iter in 0..self.max_iter {
            self.n_iter += 1;

            let proba = (x.dot(&weights) + bias).mapv(sigmoid);
            let errors = (&proba - y) * &sw;
            let dw = x.t().dot(&errors) / n + &weights * inv_c;
            let db = errors.sum() / n;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                converged = true;
                break;
            }

            // Backtrack until the step does not increase the loss
            loop {
                let next_w = &weights - &(&dw * lr);
                let next_b = bias - lr * db;
                let next_loss = objective(x, y, &sw, &next_w, next_b, inv_c);
                if next_loss <= loss || lr < 1e-12 {
                    weights = next_w;
                    bias = next_b;
                    loss = next_loss;
                    break;
                }
                lr *= 0.5;
            }
            lr = (lr * 2.0).min(self.learning_rate);
        }

        if converged {
            debug!(n_iter = self.n_iter, loss, "Logistic regression converged");
        } else {
            warn!(
                max_iter = self.max_iter,
                loss, "Logistic regression did not converge; consider raising max_iter"
            );
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;
        Ok(self)
    }

    /// Linear score `x . w + b`
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(FraudGuardError::ModelNotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(FraudGuardError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(z))` without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn objective(
    x: &Array2<f64>,
    y: &Array1<f64>,
    sw: &Array1<f64>,
    weights: &Array1<f64>,
    bias: f64,
    inv_c: f64,
) -> f64 {
    let z = x.dot(weights) + bias;
    let data_loss: f64 = z
        .iter()
        .zip(y.iter())
        .zip(sw.iter())
        .map(|((&zi, &yi), &wi)| wi * (softplus(zi) - yi * zi))
        .sum();
    data_loss / x.nrows() as f64 + 0.5 * inv_c * weights.dot(weights)
}
