//! Integration tests for the model factories and persisted pipelines

use fraudguard::features::{build_preprocessor, FeatureConfig};
use fraudguard::models::{
    build_forest_model, build_logreg_model, ForestParams, FraudPipeline, LogRegParams,
};
use ndarray::{array, Array1};
use polars::prelude::*;

fn dummy_dataset() -> (DataFrame, Array1<f64>) {
    let x = df!(
        "step" => &[1, 2, 3, 4, 5, 6],
        "type" => &["PAYMENT", "CASH_OUT", "PAYMENT", "TRANSFER", "PAYMENT", "CASH_OUT"],
        "amount" => &[100.0, 5000.0, 50.0, 7000.0, 200.0, 4500.0],
        "oldbalanceOrg" => &[1000, 6000, 500, 10000, 1500, 8000],
        "newbalanceOrg" => &[900, 1000, 450, 3000, 1300, 4000]
    )
    .unwrap();
    let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
    (x, y)
}

fn assert_valid_outputs(model: &FraudPipeline, x: &DataFrame) {
    let preds = model.predict(x).unwrap();
    assert_eq!(preds.len(), 6);
    assert!(preds.iter().all(|&p| p == 0.0 || p == 1.0));

    let proba = model.predict_proba(x).unwrap();
    assert_eq!(proba.dim(), (6, 2));
    for row in proba.rows() {
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
}

// ============================================================================
// Logistic regression
// ============================================================================

#[test]
fn test_logreg_fit_predict() {
    let (x, y) = dummy_dataset();
    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let mut model = build_logreg_model(plan, &LogRegParams::default());

    assert!(model.predict(&x).is_err());
    model.fit(&x, &y).unwrap();

    assert!(model.is_fitted());
    assert_valid_outputs(&model, &x);
    assert_eq!(model.model_type(), "logreg");
    assert!(model.decision_function(&x).unwrap().is_some());
}

// ============================================================================
// Random forest
// ============================================================================

#[test]
fn test_forest_fit_predict() {
    let (x, y) = dummy_dataset();
    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let mut model = build_forest_model(plan, &ForestParams::default().with_n_estimators(25));
    model.fit(&x, &y).unwrap();

    assert_valid_outputs(&model, &x);
    assert_eq!(model.model_type(), "forest");
    assert!(model.decision_function(&x).unwrap().is_none());

    let importances = model.feature_importances().unwrap();
    assert_eq!(importances.len(), model.feature_names().len());
    let total: f64 = importances.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_forest_is_deterministic() {
    let (x, y) = dummy_dataset();
    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let params = ForestParams::default().with_n_estimators(10);

    let mut a = build_forest_model(plan.clone(), &params);
    let mut b = build_forest_model(plan, &params);
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();

    assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_load_keeps_predictions() {
    let (x, y) = dummy_dataset();
    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let mut model = build_logreg_model(plan, &LogRegParams::default());
    model.fit(&x, &y).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fraud_model.json");
    model.save(&path).unwrap();

    let loaded = FraudPipeline::load(&path).unwrap();
    assert_eq!(loaded.model_type(), "logreg");
    assert_eq!(loaded.metadata().n_training_samples, 6);
    let before = model.predict_proba(&x).unwrap();
    let after = loaded.predict_proba(&x).unwrap();
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
    assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
}

#[test]
fn test_unseen_category_is_scored() {
    let (x, y) = dummy_dataset();
    let (plan, _, _) = build_preprocessor(&x, &FeatureConfig::new()).unwrap();
    let mut model = build_logreg_model(plan, &LogRegParams::default());
    model.fit(&x, &y).unwrap();

    let novel = df!(
        "step" => &[7],
        "type" => &["DEBIT"],
        "amount" => &[120.0],
        "oldbalanceOrg" => &[900],
        "newbalanceOrg" => &[780]
    )
    .unwrap();
    let proba = model.predict_proba(&novel).unwrap();
    assert!((proba.row(0).sum() - 1.0).abs() < 1e-9);
}
