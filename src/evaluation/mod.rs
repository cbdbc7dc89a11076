//! Model evaluation against held-out labels

pub mod metrics;

pub use metrics::{
    accuracy_score, average_precision_score, classification_report, confusion_matrix, f1_score,
    format_confusion_matrix, precision_score, recall_score, roc_auc_score, ConfusionCounts,
};

use crate::error::{FraudGuardError, Result};
use crate::models::Classifier;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Default decision threshold
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Metrics for one evaluation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Rows are truth, columns prediction, label order 0 then 1
    pub confusion_matrix: [[usize; 2]; 2],
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when only one class is present in the labels
    pub roc_auc: Option<f64>,
    /// Average precision; `None` when only one class is present
    pub pr_auc: Option<f64>,
    pub classification_report: String,
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Model Evaluation Results")?;
        writeln!(f, "{}", rule)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "{}", format_confusion_matrix(&self.confusion_matrix))?;
        writeln!(f)?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "Recall:    {:.4}", self.recall)?;
        writeln!(f, "F1-Score:  {:.4}", self.f1)?;
        if let Some(roc_auc) = self.roc_auc {
            writeln!(f, "ROC-AUC:   {:.4}", roc_auc)?;
        }
        if let Some(pr_auc) = self.pr_auc {
            writeln!(f, "PR-AUC:    {:.4}", pr_auc)?;
        }
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        write!(f, "{}", self.classification_report)
    }
}

/// Where a positive-class score came from
enum ScoreSource {
    Probability(Array1<f64>),
    Decision(Array1<f64>),
}

fn score_source(model: &dyn Classifier, x: &DataFrame) -> Result<Option<ScoreSource>> {
    if let Some(proba) = model.predict_proba(x)? {
        if proba.ncols() != 2 {
            return Err(FraudGuardError::ShapeError {
                expected: "2 probability columns".to_string(),
                actual: format!("{} columns", proba.ncols()),
            });
        }
        return Ok(Some(ScoreSource::Probability(proba.column(1).to_owned())));
    }

    if let Some(scores) = model.decision_function(x)? {
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let normalized = scores.mapv(|s| (s - min) / (max - min + 1e-10));
        return Ok(Some(ScoreSource::Decision(normalized)));
    }

    warn!("Model has no predict_proba or decision_function");
    Ok(None)
}

/// Score of the positive class.
///
/// Probability column 1 when the model has one, else the decision score
/// min-max normalized into [0, 1], else `None`.
pub fn positive_scores(model: &dyn Classifier, x: &DataFrame) -> Result<Option<Array1<f64>>> {
    Ok(score_source(model, x)?.map(|source| match source {
        ScoreSource::Probability(s) | ScoreSource::Decision(s) => s,
    }))
}

/// Evaluate `model` on `x` against `y_true`.
///
/// With a probability estimate, labels are `proba >= threshold`; otherwise
/// the model's own `predict` is used. AUCs are `None` (with a warning) when
/// `y_true` holds a single class.
pub fn evaluate_model(
    model: &dyn Classifier,
    x: &DataFrame,
    y_true: &Array1<f64>,
    threshold: f64,
) -> Result<EvaluationResult> {
    if x.height() != y_true.len() {
        return Err(FraudGuardError::ShapeError {
            expected: format!("{} labels", x.height()),
            actual: format!("{} labels", y_true.len()),
        });
    }

    let (scores, y_pred) = match score_source(model, x)? {
        Some(ScoreSource::Probability(s)) => {
            let labels = s.mapv(|p| if p >= threshold { 1.0 } else { 0.0 });
            (Some(s), labels)
        }
        Some(ScoreSource::Decision(s)) => (Some(s), model.predict(x)?),
        None => (None, model.predict(x)?),
    };

    let (roc_auc, pr_auc) = match &scores {
        Some(s) => {
            let roc = roc_auc_score(y_true, s);
            let pr = average_precision_score(y_true, s);
            if roc.is_none() {
                warn!("Could not compute AUC metrics: only one class present in y_true");
            }
            (roc, pr)
        }
        None => (None, None),
    };

    let result = EvaluationResult {
        confusion_matrix: confusion_matrix(y_true, &y_pred),
        precision: precision_score(y_true, &y_pred),
        recall: recall_score(y_true, &y_pred),
        f1: f1_score(y_true, &y_pred),
        roc_auc,
        pr_auc,
        classification_report: classification_report(y_true, &y_pred, 4),
    };

    info!(
        f1 = %format!("{:.4}", result.f1),
        roc_auc = ?result.roc_auc,
        "Evaluation complete"
    );
    Ok(result)
}
