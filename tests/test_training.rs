//! End-to-end training runs on a generated dataset

use fraudguard::data::SplitConfig;
use fraudguard::inference::{load_model, score_transaction, TransactionInput};
use fraudguard::models::ForestParams;
use fraudguard::training::{run_training, ModelChoice, TrainOptions};
use fraudguard::FraudGuardError;
use std::io::Write;
use std::path::Path;

/// 120 rows; large night-time transfers are fraud
fn write_dataset(data_dir: &Path) {
    let raw = data_dir.join("raw");
    std::fs::create_dir_all(&raw).unwrap();
    let mut file = std::fs::File::create(raw.join("transactions.csv")).unwrap();
    writeln!(file, "amount,transaction_type,device_type,transaction_time,isFraud").unwrap();

    for i in 0..120 {
        let fraud = i % 6 == 0;
        let (amount, kind, device, hour) = if fraud {
            (5000.0 + (i * 37 % 900) as f64, "TRANSFER", "web", 2 + i % 3)
        } else {
            let kind = ["PAYMENT", "DEBIT", "CASH_IN"][i % 3];
            (20.0 + (i * 13 % 400) as f64, kind, "mobile", 9 + i % 10)
        };
        let day = 1 + i % 28;
        writeln!(
            file,
            "{:.2},{},{},2025-02-{:02} {:02}:15:00,{}",
            amount,
            kind,
            device,
            day,
            hour,
            u8::from(fraud)
        )
        .unwrap();
    }
}

fn options(dir: &Path) -> TrainOptions {
    TrainOptions::new()
        .with_data_dir(dir.join("data"))
        .with_models_dir(dir.join("models"))
        .with_split(SplitConfig::default())
        .with_forest(ForestParams::default().with_n_estimators(20))
}

#[test]
fn test_train_both_selects_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("data"));

    let outcome = run_training(&options(dir.path())).unwrap();

    assert_eq!(outcome.validation_f1.len(), 2);
    assert_eq!(outcome.validation_f1[0].0, "logreg");
    assert_eq!(outcome.validation_f1[1].0, "forest");
    assert!(["logreg", "forest"].contains(&outcome.selected.as_str()));
    assert!(outcome.model_path.exists());
    assert_eq!(outcome.model_path, dir.path().join("models").join("fraud_model.json"));

    // Selected model has the best F1, first wins ties
    let best = outcome
        .validation_f1
        .iter()
        .find(|(name, _)| *name == outcome.selected)
        .map(|(_, f1)| *f1)
        .unwrap();
    assert!(outcome.validation_f1.iter().all(|(_, f1)| *f1 <= best));
    if outcome.validation_f1[0].1 == outcome.validation_f1[1].1 {
        assert_eq!(outcome.selected, "logreg");
    }
    assert!(outcome.test_result.f1 > 0.5);
}

#[test]
fn test_trained_model_scores_transactions() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("data"));

    let opts = options(dir.path()).with_model(ModelChoice::Logreg);
    run_training(&opts).unwrap();

    let model = load_model(dir.path().join("models"), "fraud_model.json").unwrap();
    assert_eq!(model.model_type(), "logreg");

    let risky = TransactionInput::new(5600.0, "TRANSFER", "web", "2025-02-03 03:15:00");
    let routine = TransactionInput::new(60.0, "PAYMENT", "mobile", "2025-02-03 12:15:00");
    let risky = score_transaction(&model, &risky, 0.5).unwrap();
    let routine = score_transaction(&model, &routine, 0.5).unwrap();

    assert!(risky.fraud_probability > routine.fraud_probability);
    assert!(risky.is_fraud);
    assert!(!routine.is_fraud);
}

#[test]
fn test_missing_data_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_training(&options(dir.path())).unwrap_err();
    assert!(matches!(err, FraudGuardError::DataNotFound { .. }));
    assert!(!dir.path().join("models").join("fraud_model.json").exists());
}

#[test]
fn test_missing_label_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("data"));

    let opts = options(dir.path()).with_target("label_that_does_not_exist");
    let err = run_training(&opts).unwrap_err();
    assert!(matches!(err, FraudGuardError::MissingColumn(_)));
}

#[test]
fn test_threshold_applies_to_reports() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("data"));

    // Every probability clears a zero threshold
    let opts = options(dir.path())
        .with_model(ModelChoice::Logreg)
        .with_threshold(0.0);
    let outcome = run_training(&opts).unwrap();

    let matrix = outcome.test_result.confusion_matrix;
    assert_eq!(matrix[0][0], 0);
    assert_eq!(matrix[1][0], 0);
    assert_eq!(outcome.test_result.recall, 1.0);
    assert!(outcome.test_result.precision < 0.5);
}
