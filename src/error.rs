//! Error types for FraudGuard

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for FraudGuard operations
pub type Result<T> = std::result::Result<T, FraudGuardError>;

/// Main error type for the fraud-scoring pipeline
#[derive(Error, Debug)]
pub enum FraudGuardError {
    #[error("Data file not found: {}. Please download the dataset and place it in data/raw/", path.display())]
    DataNotFound { path: PathBuf },

    #[error("Model not found: {}. Please run 'fraudguard train' first", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Column '{0}' not found in DataFrame")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FraudGuardError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        FraudGuardError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for FraudGuardError {
    fn from(err: polars::error::PolarsError) -> Self {
        FraudGuardError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FraudGuardError {
    fn from(err: serde_json::Error) -> Self {
        FraudGuardError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FraudGuardError {
    fn from(err: ndarray::ShapeError) -> Self {
        FraudGuardError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FraudGuardError::MissingColumn("is_fraud".to_string());
        assert_eq!(err.to_string(), "Column 'is_fraud' not found in DataFrame");
    }

    #[test]
    fn test_not_found_messages_name_the_path() {
        let err = FraudGuardError::DataNotFound {
            path: PathBuf::from("data/raw/transactions.csv"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/raw/transactions.csv"));
        assert!(msg.contains("not found"));

        let err = FraudGuardError::ModelNotFound {
            path: PathBuf::from("models/fraud_model.json"),
        };
        assert!(err.to_string().contains("fraudguard train"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FraudGuardError = io_err.into();
        assert!(matches!(err, FraudGuardError::IoError(_)));
    }
}
