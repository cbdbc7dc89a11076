//! One-hot encoding for categorical columns

use super::text_values;
use crate::error::{FraudGuardError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder over the sorted training vocabulary.
///
/// Categories not seen during fit, and nulls, encode as all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let categories = columns
            .iter()
            .map(|name| {
                let vocab: BTreeSet<String> = text_values(df, name)?.into_iter().flatten().collect();
                Ok(vocab.into_iter().collect())
            })
            .collect::<Result<Vec<Vec<String>>>>()?;

        self.columns = columns.to_vec();
        self.categories = categories;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode into an `n_rows x n_output_features` indicator matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FraudGuardError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_output_features()));
        let mut offset = 0;
        for (name, vocab) in self.columns.iter().zip(&self.categories) {
            for (i, value) in text_values(df, name)?.iter().enumerate() {
                let slot = value
                    .as_deref()
                    .and_then(|v| vocab.binary_search_by(|c| c.as_str().cmp(v)).ok());
                if let Some(k) = slot {
                    out[[i, offset + k]] = 1.0;
                }
            }
            offset += vocab.len();
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Output names as `column_value`
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, vocab)| vocab.iter().map(move |v| format!("{}_{}", name, v)))
            .collect()
    }

    pub fn n_output_features(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Vocabulary learned for `column`
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.categories[i].as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
