//! Integration tests for evaluation against held-out labels

use fraudguard::evaluation::{evaluate_model, DEFAULT_THRESHOLD};
use fraudguard::features::{build_preprocessor, FeatureConfig};
use fraudguard::models::{build_logreg_model, Classifier, LogRegParams};
use fraudguard::Result;
use ndarray::{array, Array1, Array2};
use polars::prelude::*;

/// Returns fixed fraud probabilities regardless of input
struct FixedProba(Array1<f64>);

impl Classifier for FixedProba {
    fn predict(&self, _x: &DataFrame) -> Result<Array1<f64>> {
        Ok(self.0.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, _x: &DataFrame) -> Result<Option<Array2<f64>>> {
        let n = self.0.len();
        let mut out = Array2::zeros((n, 2));
        out.column_mut(0).assign(&self.0.mapv(|p| 1.0 - p));
        out.column_mut(1).assign(&self.0);
        Ok(Some(out))
    }
}

/// Has neither probabilities nor scores
struct LabelsOnly(Array1<f64>);

impl Classifier for LabelsOnly {
    fn predict(&self, _x: &DataFrame) -> Result<Array1<f64>> {
        Ok(self.0.clone())
    }
}

fn rows(n: i32) -> DataFrame {
    df!("amount" => (0..n).map(f64::from).collect::<Vec<_>>()).unwrap()
}

#[test]
fn test_perfect_model_scores_one() {
    let model = FixedProba(array![0.1, 0.2, 0.8, 0.9]);
    let y = array![0.0, 0.0, 1.0, 1.0];

    let result = evaluate_model(&model, &rows(4), &y, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(result.confusion_matrix, [[2, 0], [0, 2]]);
    assert_eq!(result.precision, 1.0);
    assert_eq!(result.recall, 1.0);
    assert_eq!(result.f1, 1.0);
    assert_eq!(result.roc_auc, Some(1.0));
    assert_eq!(result.pr_auc, Some(1.0));
    assert!(result.classification_report.contains("accuracy"));
}

#[test]
fn test_single_class_has_no_auc() {
    let model = FixedProba(array![0.1, 0.6, 0.2]);
    let y = array![0.0, 0.0, 0.0];

    let result = evaluate_model(&model, &rows(3), &y, DEFAULT_THRESHOLD).unwrap();
    assert!(result.roc_auc.is_none());
    assert!(result.pr_auc.is_none());
    assert_eq!(result.precision, 0.0);
    assert_eq!(result.f1, 0.0);
    assert!(!result.to_string().contains("ROC-AUC"));
}

#[test]
fn test_labels_only_model() {
    let model = LabelsOnly(array![1.0, 0.0, 1.0, 0.0]);
    let y = array![1.0, 0.0, 0.0, 0.0];

    let result = evaluate_model(&model, &rows(4), &y, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(result.confusion_matrix, [[2, 1], [0, 1]]);
    assert_eq!(result.precision, 0.5);
    assert_eq!(result.recall, 1.0);
    assert!(result.roc_auc.is_none());
}

#[test]
fn test_evaluates_fitted_pipeline() {
    let x = df!(
        "amount" => &[10.0, 15.0, 12.0, 900.0, 950.0, 11.0, 14.0, 980.0],
        "type" => &["PAYMENT", "PAYMENT", "DEBIT", "TRANSFER", "CASH_OUT", "PAYMENT", "DEBIT", "TRANSFER"]
    )
    .unwrap();
    let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];

    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let mut model = build_logreg_model(plan, &LogRegParams::default());
    model.fit(&x, &y).unwrap();

    let result = evaluate_model(&model, &x, &y, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(result.recall, 1.0);
    assert!(result.roc_auc.unwrap() > 0.9);

    let rendered = result.to_string();
    assert!(rendered.contains("Model Evaluation Results"));
    assert!(rendered.contains("Confusion Matrix:"));
}
