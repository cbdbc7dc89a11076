//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::FraudGuardError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Pipeline(#[from] FraudGuardError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ModelUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
            ServerError::Pipeline(e) => match e {
                FraudGuardError::InvalidParameter { .. }
                | FraudGuardError::MissingColumn(_)
                | FraudGuardError::DataError(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                FraudGuardError::ModelNotFound { .. } | FraudGuardError::ModelNotFitted => {
                    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
                }
                _ => {
                    tracing::error!(detail = %e, "Scoring error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Scoring failed. Check server logs for details.".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
