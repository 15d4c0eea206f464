//! HTTP handlers

pub mod health;
pub mod orders;
pub mod products;
pub mod users;

pub use health::health;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body extractor, mapping any rejection (syntax error,
/// wrong content type, failed coercion) to a 400 envelope.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|_| ApiError::InvalidInput("Invalid JSON body".to_string()))
}

pub(crate) fn require_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::InvalidInput("Invalid id".to_string()));
    }
    Ok(())
}
