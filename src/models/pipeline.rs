//! Preprocessing plus classifier, persisted as one artifact

use crate::error::{FraudGuardError, Result};
use crate::preprocessing::ColumnPreprocessor;
use crate::training::{LogisticRegression, RandomForest};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Anything that scores a feature table.
///
/// `predict` is required; the two scoring methods are optional so the
/// evaluator can fall back from probabilities to decision scores.
pub trait Classifier {
    /// Hard 0/1 labels
    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>>;

    /// `n x 2` probabilities for classes 0 and 1, if the model has them
    fn predict_proba(&self, _x: &DataFrame) -> Result<Option<Array2<f64>>> {
        Ok(None)
    }

    /// Unbounded decision scores, if the model has them
    fn decision_function(&self, _x: &DataFrame) -> Result<Option<Array1<f64>>> {
        Ok(None)
    }
}

/// The estimator inside a [`FraudPipeline`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifierKind {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ClassifierKind {
    /// Short family name, as accepted by `fraudguard train --model`
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::LogisticRegression(_) => "logreg",
            ClassifierKind::RandomForest(_) => "forest",
        }
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            ClassifierKind::LogisticRegression(m) => m.fit(x, y).map(|_| ()),
            ClassifierKind::RandomForest(m) => m.fit(x, y).map(|_| ()),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            ClassifierKind::LogisticRegression(m) => {
                let positive = m.predict_proba(x)?;
                let mut out = Array2::zeros((positive.len(), 2));
                for (i, p) in positive.iter().enumerate() {
                    out[[i, 0]] = 1.0 - p;
                    out[[i, 1]] = *p;
                }
                Ok(out)
            }
            ClassifierKind::RandomForest(m) => m.predict_proba(x),
        }
    }
}

/// Provenance stored with the model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub model_type: String,
    /// RFC 3339 time of the last fit
    pub created_at: Option<String>,
    pub crate_version: String,
    pub n_training_samples: usize,
    pub feature_names: Vec<String>,
}

/// Two-stage pipeline: [`ColumnPreprocessor`] then a classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudPipeline {
    preprocessor: ColumnPreprocessor,
    classifier: ClassifierKind,
    metadata: PipelineMetadata,
    is_fitted: bool,
}

impl FraudPipeline {
    /// Wrap an unfitted plan and classifier
    pub fn new(preprocessor: ColumnPreprocessor, classifier: ClassifierKind) -> Self {
        let metadata = PipelineMetadata {
            model_type: classifier.name().to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        };
        Self {
            preprocessor,
            classifier,
            metadata,
            is_fitted: false,
        }
    }

    /// Fit the plan on `x`, then the classifier on the transformed rows
    pub fn fit(&mut self, x: &DataFrame, y: &Array1<f64>) -> Result<&mut Self> {
        if x.height() != y.len() {
            return Err(FraudGuardError::ShapeError {
                expected: format!("y length = {}", x.height()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let design = self.preprocessor.fit_transform(x)?;
        self.classifier.fit(&design, y)?;

        self.metadata.created_at = Some(chrono::Utc::now().to_rfc3339());
        self.metadata.n_training_samples = x.height();
        self.metadata.feature_names = self.preprocessor.feature_names_out();
        self.is_fitted = true;

        info!(
            model = self.classifier.name(),
            rows = x.height(),
            features = design.ncols(),
            "Fitted pipeline"
        );
        Ok(self)
    }

    fn design_matrix(&self, x: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FraudGuardError::ModelNotFitted);
        }
        self.preprocessor.transform(x)
    }

    /// `n x 2` class probabilities; each row sums to 1
    pub fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>> {
        let design = self.design_matrix(x)?;
        self.classifier.predict_proba(&design)
    }

    /// Labels at the 0.5 probability cut
    pub fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(1).mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Linear score for logistic regression; forests have none
    pub fn decision_function(&self, x: &DataFrame) -> Result<Option<Array1<f64>>> {
        match &self.classifier {
            ClassifierKind::LogisticRegression(m) => {
                let design = self.design_matrix(x)?;
                Ok(Some(m.decision_function(&design)?))
            }
            ClassifierKind::RandomForest(_) => Ok(None),
        }
    }

    /// Output feature names of the fitted plan
    pub fn feature_names(&self) -> Vec<String> {
        self.preprocessor.feature_names_out()
    }

    /// Per-feature importance, sorted descending.
    ///
    /// Mean impurity decrease for forests, absolute coefficients for
    /// logistic regression.
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let values: Vec<f64> = match &self.classifier {
            ClassifierKind::LogisticRegression(m) => {
                m.coefficients.as_ref()?.iter().map(|c| c.abs()).collect()
            }
            ClassifierKind::RandomForest(m) => m.feature_importances()?.to_vec(),
        };

        let mut pairs: Vec<(String, f64)> = self.feature_names().into_iter().zip(values).collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some(pairs)
    }

    pub fn preprocessor(&self) -> &ColumnPreprocessor {
        &self.preprocessor
    }

    pub fn classifier(&self) -> &ClassifierKind {
        &self.classifier
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    pub fn model_type(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Write the pipeline as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Read a pipeline written by [`save`](Self::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FraudGuardError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let pipeline: Self = serde_json::from_str(&json)?;
        Ok(pipeline)
    }
}

impl Classifier for FraudPipeline {
    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        FraudPipeline::predict(self, x)
    }

    fn predict_proba(&self, x: &DataFrame) -> Result<Option<Array2<f64>>> {
        FraudPipeline::predict_proba(self, x).map(Some)
    }

    fn decision_function(&self, x: &DataFrame) -> Result<Option<Array1<f64>>> {
        FraudPipeline::decision_function(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame() -> DataFrame {
        df!(
            "amount" => &[10.0, 12.0, 11.0, 900.0, 950.0, 13.0],
            "transaction_type" => &["PAYMENT", "PAYMENT", "DEBIT", "TRANSFER", "TRANSFER", "PAYMENT"],
        )
        .unwrap()
    }

    fn plan() -> ColumnPreprocessor {
        ColumnPreprocessor::new(vec!["amount".into()], vec!["transaction_type".into()])
    }

    #[test]
    fn test_unfitted_pipeline() {
        let pipeline = FraudPipeline::new(
            plan(),
            ClassifierKind::LogisticRegression(LogisticRegression::new()),
        );
        assert!(!pipeline.is_fitted());
        assert_eq!(pipeline.model_type(), "logreg");
        assert!(matches!(
            pipeline.predict(&frame()),
            Err(FraudGuardError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_fit_sets_metadata() {
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let mut pipeline = FraudPipeline::new(
            plan(),
            ClassifierKind::LogisticRegression(LogisticRegression::new()),
        );
        pipeline.fit(&frame(), &y).unwrap();

        let meta = pipeline.metadata();
        assert_eq!(meta.n_training_samples, 6);
        assert!(meta.created_at.is_some());
        assert_eq!(
            meta.feature_names,
            vec![
                "amount",
                "transaction_type_DEBIT",
                "transaction_type_PAYMENT",
                "transaction_type_TRANSFER"
            ]
        );
    }

    #[test]
    fn test_forest_has_no_decision_function() {
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let mut pipeline = FraudPipeline::new(
            plan(),
            ClassifierKind::RandomForest(RandomForest::new(5)),
        );
        pipeline.fit(&frame(), &y).unwrap();
        assert!(pipeline.decision_function(&frame()).unwrap().is_none());
        assert_eq!(pipeline.feature_importances().unwrap().len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FraudPipeline::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FraudGuardError::ModelNotFound { .. }));
    }
}
