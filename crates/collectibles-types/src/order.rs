//! Order types
//!
//! Line items capture the unit price at order time; `product_name` and
//! `subtotal` are view fields filled in on reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;

/// Stored order with its line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub qty: i64,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub subtotal: Decimal,
}

impl OrderItem {
    pub fn new(product_id: String, qty: i64, price: Decimal) -> Self {
        Self {
            product_id,
            qty,
            price,
            product_name: None,
            subtotal: price * Decimal::from(qty),
        }
    }
}

/// Creation payload for `POST /orders`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderCreate {
    pub user_id: Option<String>,
    pub items: Option<Vec<OrderItemCreate>>,
}

/// One requested line in an order creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_integer")]
    pub qty: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_is_price_times_qty() {
        let item = OrderItem::new("p1".to_string(), 3, "499.00".parse().unwrap());
        assert_eq!(item.subtotal, "1497.00".parse::<Decimal>().unwrap());
    }
}
