//! User handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use collectibles_types::{Envelope, User, UserCreate, UserPatch};
use tracing::info;

use crate::error::ApiError;
use crate::storage::StoreError;
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    super::require_id(&id)?;
    let body = super::json_body(body)?;

    let (name, email) = match (body.name, body.email) {
        (Some(name), Some(email))
            if !name.trim().is_empty() && !email.trim().is_empty() =>
        {
            (name, email)
        }
        _ => {
            return Err(ApiError::InvalidInput(
                "Invalid body. Required: name, email".to_string(),
            ))
        }
    };

    let user = User { id, name, email };
    match state.store.insert_user(&user).await {
        Ok(()) => {
            info!("Created user {}", user.id);
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(StoreError::DuplicateId) => {
            Err(ApiError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let patch = super::json_body(body)?;

    if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::InvalidInput("Invalid name".to_string()));
    }
    if matches!(&patch.email, Some(email) if email.trim().is_empty()) {
        return Err(ApiError::InvalidInput("Invalid email".to_string()));
    }

    state
        .store
        .patch_user(&id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    if state.store.delete_user(&id).await? {
        info!("Deleted user {}", id);
        Ok(Json(Envelope::new("User deleted")))
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

pub async fn probe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    if state.store.user_exists(&id).await? {
        Ok(Json(Envelope::new("User exists")))
    } else {
        Err(ApiError::NotFound("User does not exist".to_string()))
    }
}
