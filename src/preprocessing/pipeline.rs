//! Column preprocessing plan

use super::{OneHotEncoder, StandardScaler};
use crate::error::{FraudGuardError, Result};
use ndarray::{s, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Transformation plan: scale numeric columns, one-hot encode categorical
/// columns, drop everything else.
///
/// Fit once on the training split; afterwards the plan is only read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl ColumnPreprocessor {
    /// Create an unfitted plan over the given columns
    pub fn new(numeric_columns: Vec<String>, categorical_columns: Vec<String>) -> Self {
        Self {
            numeric_columns,
            categorical_columns,
            scaler: StandardScaler::new(),
            encoder: OneHotEncoder::new(),
            is_fitted: false,
        }
    }

    /// Fit scaling parameters and vocabularies on `df`
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.check_columns(df)?;

        self.scaler.fit(df, &self.numeric_columns)?;
        self.encoder.fit(df, &self.categorical_columns)?;
        self.is_fitted = true;

        info!(
            rows = df.height(),
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            features_out = self.n_features_out(),
            "Fitted preprocessor"
        );
        Ok(self)
    }

    /// Transform `df` into a dense design matrix.
    ///
    /// Numeric outputs come first, then one-hot blocks, in the order of
    /// [`feature_names_out`](Self::feature_names_out).
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FraudGuardError::ModelNotFitted);
        }
        self.check_columns(df)?;

        let numeric = self.scaler.transform(df)?;
        let encoded = self.encoder.transform(df)?;

        let k = numeric.ncols();
        let mut out = Array2::zeros((df.height(), k + encoded.ncols()));
        out.slice_mut(s![.., ..k]).assign(&numeric);
        out.slice_mut(s![.., k..]).assign(&encoded);
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the output features, `col` for numeric and `col_value` for one-hot
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        names.extend(self.encoder.feature_names());
        names
    }

    pub fn n_features_out(&self) -> usize {
        self.numeric_columns.len() + self.encoder.n_output_features()
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        for name in self.numeric_columns.iter().chain(&self.categorical_columns) {
            if df.column(name).is_err() {
                return Err(FraudGuardError::MissingColumn(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dataframe() -> DataFrame {
        DataFrame::new(vec![
            Series::new("amount".into(), &[10.0, 20.0, 30.0, 40.0]).into(),
            Series::new("type".into(), &["PAYMENT", "TRANSFER", "PAYMENT", "CASH_OUT"]).into(),
            Series::new("account_id".into(), &["a1", "a2", "a3", "a4"]).into(),
        ])
        .unwrap()
    }

    fn plan() -> ColumnPreprocessor {
        ColumnPreprocessor::new(vec!["amount".into()], vec!["type".into()])
    }

    #[test]
    fn test_fit_transform_layout() {
        let df = create_test_dataframe();
        let mut pre = plan();
        let x = pre.fit_transform(&df).unwrap();

        assert_eq!(
            pre.feature_names_out(),
            vec!["amount", "type_CASH_OUT", "type_PAYMENT", "type_TRANSFER"]
        );
        assert_eq!(x.shape(), &[4, 4]);
        assert_eq!(x.row(3).slice(s![1..]).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unclassified_columns_dropped() {
        let df = create_test_dataframe();
        let mut pre = plan();
        pre.fit(&df).unwrap();
        assert!(!pre.feature_names_out().iter().any(|n| n.starts_with("account_id")));
    }

    #[test]
    fn test_transform_before_fit() {
        let df = create_test_dataframe();
        assert!(matches!(
            plan().transform(&df),
            Err(FraudGuardError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_missing_planned_column() {
        let df = create_test_dataframe();
        let mut pre = plan();
        pre.fit(&df).unwrap();

        let partial = df.drop("type").unwrap();
        let err = pre.transform(&partial).unwrap_err();
        assert!(matches!(err, FraudGuardError::MissingColumn(ref c) if c == "type"));
    }

    #[test]
    fn test_fitted_plan_is_reused_unchanged() {
        let df = create_test_dataframe();
        let mut pre = plan();
        pre.fit(&df).unwrap();
        let means = pre.scaler().means();

        let other = df!(
            "amount" => &[1000.0],
            "type" => &["DEBIT"],
        )
        .unwrap();
        let x = pre.transform(&other).unwrap();
        assert_eq!(pre.scaler().means(), means);
        assert_eq!(x.row(0).slice(s![1..]).sum(), 0.0);
    }
}
