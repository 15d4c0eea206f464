//! In-memory store using DashMap
//!
//! Duplicate-id detection goes through the map entry API, so concurrent
//! creates at the same id cannot both succeed. The email-uniqueness check
//! is a pre-insert scan and is best-effort under concurrency.

use chrono::Utc;
use collectibles_types::{Order, OrderItem, Product, ProductPatch, User, UserPatch};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{OfferWrite, Store, StoreError};
use async_trait::async_trait;

pub struct MemoryStore {
    users: DashMap<String, User>,
    products: DashMap<String, Product>,
    orders: DashMap<i64, Order>,
    next_order_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            products: DashMap::new(),
            orders: DashMap::new(),
            next_order_id: AtomicI64::new(1),
        }
    }

    /// Fill item view fields from the live product map (left-join
    /// semantics: a deleted product leaves `product_name` empty).
    fn resolve_items(&self, mut order: Order) -> Order {
        for item in &mut order.items {
            item.product_name = self
                .products
                .get(&item.product_id)
                .map(|p| p.name.clone());
        }
        order
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut out: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn user_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(id))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::DuplicateId);
        }
        if self
            .users
            .iter()
            .any(|u| u.key() != &user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, StoreError> {
        if let Some(email) = &patch.email {
            if self.users.iter().any(|u| u.key() != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        Ok(self.users.get_mut(id).map(|mut user| {
            patch.apply(&mut user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.users.remove(id).is_some())
    }

    async fn list_products(
        &self,
        name_filter: Option<&str>,
    ) -> Result<Vec<Product>, StoreError> {
        let needle = name_filter.map(|q| q.to_lowercase());
        let mut out: Vec<Product> = self
            .products
            .iter()
            .filter(|p| match &needle {
                Some(q) => p.name.to_lowercase().contains(q),
                None => true,
            })
            .map(|p| p.value().clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).map(|p| p.value().clone()))
    }

    async fn product_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.products.contains_key(id))
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        match self.products.entry(product.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId),
            Entry::Vacant(slot) => {
                slot.insert(product.clone());
                Ok(())
            }
        }
    }

    async fn patch_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get_mut(id).map(|mut product| {
            patch.apply(&mut product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.products.remove(id).is_some())
    }

    async fn upsert_offer(
        &self,
        product_id: &str,
        offer: &OfferWrite,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get_mut(product_id).map(|mut product| {
            product.promo_price = Some(offer.promo_price);
            product.valid_until = Some(offer.valid_until);
            product.clone()
        }))
    }

    async fn delete_offer(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get_mut(product_id).map(|mut product| {
            product.promo_price = None;
            product.valid_until = None;
            product.clone()
        }))
    }

    async fn create_order(
        &self,
        user_id: &str,
        items: &[OrderItem],
    ) -> Result<Order, StoreError> {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            user_id: user_id.to_string(),
            total: items.iter().map(|i| i.subtotal).sum::<Decimal>(),
            created_at: Utc::now(),
            items: items.to_vec(),
        };
        self.orders.insert(id, order.clone());
        Ok(self.resolve_items(order))
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .get(&id)
            .map(|o| self.resolve_items(o.value().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            email: email.to_string(),
        }
    }

    fn product(id: &str, name: &str, price: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            descr: None,
            image_url: None,
            price: price.parse().unwrap(),
            stock,
            promo_price: None,
            valid_until: None,
        }
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_and_record_kept() {
        let store = MemoryStore::new();
        store.insert_user(&user("1", "a@example.com")).await.unwrap();

        let result = store.insert_user(&user("1", "b@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateId)));

        let kept = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(kept.email, "a@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(&user("1", "a@example.com")).await.unwrap();

        let result = store.insert_user(&user("2", "a@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn patch_merges_only_present_fields() {
        let store = MemoryStore::new();
        store
            .insert_product(&product("p1", "Figura Goku", "499.00", 10))
            .await
            .unwrap();

        let patch = ProductPatch {
            stock: Some(7),
            ..Default::default()
        };
        let updated = store.patch_product("p1", &patch).await.unwrap().unwrap();
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.name, "Figura Goku");
        assert_eq!(updated.price, "499.00".parse().unwrap());
    }

    #[tokio::test]
    async fn patch_missing_id_returns_none() {
        let store = MemoryStore::new();
        let patch = UserPatch::default();
        assert!(store.patch_user("nope", &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_failure() {
        let store = MemoryStore::new();
        store.insert_user(&user("1", "a@example.com")).await.unwrap();

        assert!(store.delete_user("1").await.unwrap());
        assert!(!store.delete_user("1").await.unwrap());
        assert!(store.get_user("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_sorted_by_id_and_filterable() {
        let store = MemoryStore::new();
        store
            .insert_product(&product("p2", "Carta Pikachu", "1299.00", 5))
            .await
            .unwrap();
        store
            .insert_product(&product("p1", "Figura Goku", "499.00", 10))
            .await
            .unwrap();

        let all = store.list_products(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "p1");
        assert_eq!(all[1].id, "p2");

        let goku = store.list_products(Some("gOkU")).await.unwrap();
        assert_eq!(goku.len(), 1);
        assert_eq!(goku[0].id, "p1");
    }

    #[tokio::test]
    async fn offer_upsert_and_delete_round_trip() {
        let store = MemoryStore::new();
        store
            .insert_product(&product("p1", "Figura Goku", "499.00", 10))
            .await
            .unwrap();

        let offer = OfferWrite {
            promo_price: "399.00".parse().unwrap(),
            valid_until: "2026-12-31".parse().unwrap(),
        };
        let with_offer = store.upsert_offer("p1", &offer).await.unwrap().unwrap();
        assert_eq!(with_offer.promo_price, Some("399.00".parse().unwrap()));

        let without = store.delete_offer("p1").await.unwrap().unwrap();
        assert!(without.promo_price.is_none());
        assert!(without.valid_until.is_none());

        assert!(store.upsert_offer("nope", &offer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn orders_get_sequential_ids_and_live_product_names() {
        let store = MemoryStore::new();
        store
            .insert_product(&product("p1", "Figura Goku", "499.00", 10))
            .await
            .unwrap();

        let items = vec![OrderItem::new(
            "p1".to_string(),
            2,
            "499.00".parse().unwrap(),
        )];
        let first = store.create_order("1", &items).await.unwrap();
        let second = store.create_order("1", &items).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.total, "998.00".parse::<Decimal>().unwrap());

        let fetched = store.get_order(first.id).await.unwrap().unwrap();
        assert_eq!(
            fetched.items[0].product_name.as_deref(),
            Some("Figura Goku")
        );
    }
}
