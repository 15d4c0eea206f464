//! Storage layer
//!
//! Two interchangeable backends behind the [`Store`] trait: SQLite
//! (embedded, file-backed) and a DashMap in-memory store. Handlers hold an
//! `Arc<dyn Store>` injected at startup, so tests can substitute either.

pub mod db;
pub mod memory;

pub use db::Database;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use collectibles_types::{Order, OrderItem, Product, ProductPatch, User, UserPatch};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("id already exists")]
    DuplicateId,

    #[error("email already used")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Validated offer payload handed to the store.
#[derive(Debug, Clone, Copy)]
pub struct OfferWrite {
    pub promo_price: Decimal,
    pub valid_until: NaiveDate,
}

/// Backing persistence for all resources.
///
/// Lists are sorted by id. Patch operations merge only the fields present
/// in the patch and return `None` when the id is absent. Delete operations
/// report whether a record existed.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn user_exists(&self, id: &str) -> Result<bool, StoreError>;
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: &str) -> Result<bool, StoreError>;

    // Products
    async fn list_products(&self, name_filter: Option<&str>)
        -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn product_exists(&self, id: &str) -> Result<bool, StoreError>;
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
    async fn patch_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError>;
    async fn delete_product(&self, id: &str) -> Result<bool, StoreError>;

    // Offers (None = product absent)
    async fn upsert_offer(
        &self,
        product_id: &str,
        offer: &OfferWrite,
    ) -> Result<Option<Product>, StoreError>;
    async fn delete_offer(&self, product_id: &str) -> Result<Option<Product>, StoreError>;

    // Orders
    async fn create_order(&self, user_id: &str, items: &[OrderItem])
        -> Result<Order, StoreError>;
    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError>;
}
