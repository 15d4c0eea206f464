//! API error taxonomy and its HTTP mapping
//!
//! Handlers return `Result<_, ApiError>`; the `IntoResponse` impl renders
//! every failure as the `{"message": ...}` envelope with the matching
//! status code. Internal failures are logged here and never leak detail
//! to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use collectibles_types::Envelope;
use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed JSON, missing/blank required fields, failed coercion -> 400
    #[error("{0}")]
    InvalidInput(String),

    /// Operation targets a non-existent id -> 404
    #[error("{0}")]
    NotFound(String),

    /// Duplicate id or violated uniqueness constraint -> 409
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store failure -> 500
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateId => ApiError::Conflict("Already exists".to_string()),
            StoreError::DuplicateEmail => ApiError::Conflict("Email already used".to_string()),
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Internal(e) => {
                tracing::error!("Unhandled store failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(Envelope::new(message))).into_response()
    }
}
