//! Product types
//!
//! A product optionally carries a promotional offer (`promo_price` +
//! `valid_until`). The offer lives in its own table in the SQLite backend
//! and is joined into the record on reads; when absent the fields are
//! omitted from the JSON representation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;

/// Stored product record, offer included when one exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
}

impl Product {
    /// Unit price a buyer pays on `date`: the promo price while an offer
    /// is still valid, the base price otherwise.
    pub fn effective_price(&self, date: NaiveDate) -> Decimal {
        match (self.promo_price, self.valid_until) {
            (Some(promo), Some(until)) if date <= until => promo,
            _ => self.price,
        }
    }
}

/// Creation payload for `POST /products/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductCreate {
    pub name: Option<String>,
    pub descr: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_integer")]
    pub stock: Option<i64>,
}

/// Partial update for `PUT /products/{id}`; absent or `null` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub descr: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_integer")]
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// Merge present fields into `product`. Offer fields are managed
    /// through the offer endpoints, never through a product patch.
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(descr) = &self.descr {
            product.descr = Some(descr.clone());
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Payload for `PUT /products/{id}/offer`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferUpsert {
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub promo_price: Option<Decimal>,
    pub valid_until: Option<String>,
}
