//! Order handlers
//!
//! The unit price of each line is captured at order time: the promo price
//! while the product has an unexpired offer, the base price otherwise.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use collectibles_types::{Order, OrderCreate, OrderItem};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<OrderCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let body = super::json_body(body)?;

    let user_id = match body.user_id {
        Some(user_id) if !user_id.trim().is_empty() => user_id,
        _ => {
            return Err(ApiError::InvalidInput(
                "Invalid body. Required: user_id, items".to_string(),
            ))
        }
    };
    let requested = match body.items {
        Some(items) if !items.is_empty() => items,
        _ => {
            return Err(ApiError::InvalidInput(
                "Invalid body. Required: user_id, items".to_string(),
            ))
        }
    };

    if !state.store.user_exists(&user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let today = Utc::now().date_naive();
    let mut items = Vec::with_capacity(requested.len());
    for line in requested {
        let product_id = match line.product_id {
            Some(product_id) if !product_id.trim().is_empty() => product_id,
            _ => {
                return Err(ApiError::InvalidInput(
                    "Invalid item. Required: product_id, qty".to_string(),
                ))
            }
        };
        let qty = match line.qty {
            Some(qty) if qty > 0 => qty,
            _ => return Err(ApiError::InvalidInput("Invalid qty".to_string())),
        };

        let product = state
            .store
            .get_product(&product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
        items.push(OrderItem::new(
            product_id,
            qty,
            product.effective_price(today),
        ));
    }

    let order = state.store.create_order(&user_id, &items).await?;
    info!("Created order {} for user {}", order.id, order.user_id);
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid id".to_string()))?;
    state
        .store
        .get_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))
}
