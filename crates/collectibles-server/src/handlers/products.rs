//! Product handlers
//!
//! Offers ride along on the product resource: `PUT`/`DELETE` on
//! `/products/{id}/offer` manage the promotional price, and every product
//! read carries the offer fields when one exists.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use collectibles_types::{Envelope, OfferUpsert, Product, ProductCreate, ProductPatch};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::storage::{OfferWrite, StoreError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    Ok(Json(state.store.list_products(filter).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .store
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProductCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    super::require_id(&id)?;
    let body = super::json_body(body)?;

    let (name, price, stock) = match (body.name, body.price, body.stock) {
        (Some(name), Some(price), Some(stock)) if !name.trim().is_empty() => {
            (name, price, stock)
        }
        _ => {
            return Err(ApiError::InvalidInput(
                "Invalid body. Required: name, price, stock".to_string(),
            ))
        }
    };
    require_non_negative_price(price)?;
    require_non_negative_stock(stock)?;

    let product = Product {
        id,
        name,
        descr: body.descr,
        image_url: body.image_url,
        price,
        stock,
        promo_price: None,
        valid_until: None,
    };
    match state.store.insert_product(&product).await {
        Ok(()) => {
            info!("Created product {}", product.id);
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(StoreError::DuplicateId) => {
            Err(ApiError::Conflict("Product already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let patch = super::json_body(body)?;

    if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::InvalidInput("Invalid name".to_string()));
    }
    if let Some(price) = patch.price {
        require_non_negative_price(price)?;
    }
    if let Some(stock) = patch.stock {
        require_non_negative_stock(stock)?;
    }

    state
        .store
        .patch_product(&id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    if state.store.delete_product(&id).await? {
        info!("Deleted product {}", id);
        Ok(Json(Envelope::new("Product deleted")))
    } else {
        Err(ApiError::NotFound("Product not found".to_string()))
    }
}

pub async fn probe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    if state.store.product_exists(&id).await? {
        Ok(Json(Envelope::new("Product exists")))
    } else {
        Err(ApiError::NotFound("Product does not exist".to_string()))
    }
}

pub async fn upsert_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<OfferUpsert>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let body = super::json_body(body)?;

    let (promo_price, valid_until) = match (body.promo_price, body.valid_until) {
        (Some(price), Some(until)) => (price, until),
        _ => {
            return Err(ApiError::InvalidInput(
                "Invalid body. Required: promo_price, valid_until".to_string(),
            ))
        }
    };
    if promo_price.is_sign_negative() {
        return Err(ApiError::InvalidInput("Invalid promo_price".to_string()));
    }
    let valid_until = valid_until.trim().parse::<NaiveDate>().map_err(|_| {
        ApiError::InvalidInput("Invalid valid_until. Expected YYYY-MM-DD".to_string())
    })?;

    let offer = OfferWrite {
        promo_price,
        valid_until,
    };
    state
        .store
        .upsert_offer(&id, &offer)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

pub async fn delete_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .store
        .delete_offer(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

fn require_non_negative_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::InvalidInput("Invalid price".to_string()));
    }
    Ok(())
}

fn require_non_negative_stock(stock: i64) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::InvalidInput("Invalid stock".to_string()));
    }
    Ok(())
}
