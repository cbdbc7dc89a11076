//! Standard scaling for numeric columns

use super::numeric_values;
use crate::error::{FraudGuardError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters learned for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    scale: f64,
}

/// Zero-mean, unit-variance scaler.
///
/// Uses the population standard deviation; a constant column scales by 1.
/// Missing values are filled with the training mean, which is 0 after
/// scaling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to `columns` of `df`
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let params = columns
            .iter()
            .map(|name| Ok(compute_params(&numeric_values(df, name)?)))
            .collect::<Result<Vec<_>>>()?;

        self.columns = columns.to_vec();
        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns into an `n_rows x n_columns` matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FraudGuardError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.columns.len()));
        for (j, (name, p)) in self.columns.iter().zip(&self.params).enumerate() {
            for (i, v) in numeric_values(df, name)?.into_iter().enumerate() {
                out[[i, j]] = v.map_or(0.0, |x| (x - p.mean) / p.scale);
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned means, in column order
    pub fn means(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.mean).collect()
    }

    /// Learned scales, in column order
    pub fn scales(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.scale).collect()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

fn compute_params(values: &[Option<f64>]) -> ScalerParams {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return ScalerParams { mean: 0.0, scale: 1.0 };
    }

    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();

    ScalerParams {
        mean,
        scale: if std < 1e-12 { 1.0 } else { std },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_scaling_population_std() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&df, &cols(&["a"])).unwrap();

        assert!((scaler.means()[0] - 2.5).abs() < 1e-12);
        assert!((scaler.scales()[0] - 1.25f64.sqrt()).abs() < 1e-12);
        assert!(out.column(0).sum().abs() < 1e-10);
        let var = out.column(0).mapv(|x| x * x).mean().unwrap();
        assert!((var - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let df = df!("c" => &[5.0, 5.0, 5.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&df, &cols(&["c"])).unwrap();
        assert_eq!(scaler.scales(), vec![1.0]);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_missing_values_become_zero() {
        let train = df!("a" => &[2.0, 4.0]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&train, &cols(&["a"])).unwrap();

        let test = df!("a" => &[None, Some(4.0)]).unwrap();
        let out = scaler.transform(&test).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert!((out[[1, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            StandardScaler::new().transform(&df),
            Err(FraudGuardError::ModelNotFitted)
        ));
    }
}
