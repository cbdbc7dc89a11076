//! Dataset loading and splitting
//!
//! - [`load_raw_data`] resolves a file name under `<data_dir>/raw/` and reads it
//! - [`train_valid_test_split`] produces stratified train/validation/test parts

mod loader;
mod split;

pub use loader::{load_raw_data, raw_data_path, read_table, RAW_SUBDIR};
pub use split::{train_valid_test_split, DatasetSplit, SplitConfig};

use crate::error::{FraudGuardError, Result};
use ndarray::Array1;
use polars::prelude::*;

/// Extract a label column as `Array1<f64>`.
///
/// Booleans and integers are cast to `0.0` / `1.0`; nulls and values that
/// do not parse as numbers are rejected.
pub fn label_array(df: &DataFrame, target_col: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target_col)
        .map_err(|_| FraudGuardError::MissingColumn(target_col.to_string()))?;

    if column.null_count() > 0 {
        return Err(FraudGuardError::DataError(format!(
            "Target column '{}' contains {} null values",
            target_col,
            column.null_count()
        )));
    }

    // Non-numeric text casts to null
    let casted = column.cast(&DataType::Float64)?;
    if casted.null_count() > 0 {
        return Err(FraudGuardError::DataError(format!(
            "Target column '{}' has {} values that are not numeric labels",
            target_col,
            casted.null_count()
        )));
    }

    let values: Array1<f64> = casted.f64()?.into_no_null_iter().collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_array_casts_integers() {
        let df = df!("isFraud" => &[0i64, 1, 0]).unwrap();
        let y = label_array(&df, "isFraud").unwrap();
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_label_array_missing_column() {
        let df = df!("amount" => &[1.0, 2.0]).unwrap();
        let err = label_array(&df, "isFraud").unwrap_err();
        assert!(matches!(err, FraudGuardError::MissingColumn(ref c) if c == "isFraud"));
    }

    #[test]
    fn test_label_array_casts_booleans() {
        let df = df!("isFraud" => &[true, false]).unwrap();
        assert_eq!(label_array(&df, "isFraud").unwrap().to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_label_array_rejects_nulls() {
        let df = df!("label" => &[Some(1i32), None]).unwrap();
        assert!(matches!(
            label_array(&df, "label"),
            Err(FraudGuardError::DataError(_))
        ));
    }
}
