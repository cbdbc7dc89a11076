//! Column-wise preprocessing
//!
//! - Standard scaling of numeric columns, missing values filled with the training mean
//! - One-hot encoding of categorical columns over the training vocabulary
//! - [`ColumnPreprocessor`] composes both and emits a dense design matrix

mod encoder;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use pipeline::ColumnPreprocessor;
pub use scaler::StandardScaler;

use crate::error::{FraudGuardError, Result};
use polars::prelude::*;

/// Read a column as `f64`, mapping nulls and non-finite values to `None`
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| FraudGuardError::MissingColumn(name.to_string()))?;
    let casted = column.cast(&DataType::Float64).map_err(|e| {
        FraudGuardError::PreprocessingError(format!("column '{}' is not numeric: {}", name, e))
    })?;

    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Read a column as text, mapping nulls to `None`
pub(crate) fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| FraudGuardError::MissingColumn(name.to_string()))?;
    let casted = column.cast(&DataType::String)?;

    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_casts_and_masks() {
        let df = df!("x" => &[Some(1i64), None, Some(3)]).unwrap();
        assert_eq!(
            numeric_values(&df, "x").unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );

        let df = df!("x" => &[1.0, f64::NAN]).unwrap();
        assert_eq!(numeric_values(&df, "x").unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_text_values_stringifies() {
        let df = df!("code" => &[1i32, 2]).unwrap();
        assert_eq!(
            text_values(&df, "code").unwrap(),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
        assert!(matches!(
            text_values(&df, "missing"),
            Err(FraudGuardError::MissingColumn(_))
        ));
    }
}
