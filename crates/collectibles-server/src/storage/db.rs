//! SQLite store (embedded, no external dependencies)
//!
//! One pooled statement per operation, no cross-operation transactions.
//! Uniqueness is enforced by the schema and surfaced as domain errors at
//! this boundary. Partial updates run as a single `COALESCE` statement so
//! concurrent patches never interleave a read-modify-write. Decimals are
//! stored as canonical strings.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use collectibles_types::{Order, OrderItem, Product, ProductPatch, User, UserPatch};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::{OfferWrite, Store, StoreError};
use async_trait::async_trait;

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;

            let test_file = parent.join(".write_test");
            match tokio::fs::write(&test_file, b"test").await {
                Ok(_) => {
                    let _ = tokio::fs::remove_file(&test_file).await;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Database directory is not writable: {}: {}",
                        parent.display(),
                        e
                    ));
                }
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        tracing::info!("SQLite connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id    TEXT PRIMARY KEY,
                name  TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id        TEXT PRIMARY KEY,
                name      TEXT NOT NULL,
                descr     TEXT,
                image_url TEXT,
                price     TEXT NOT NULL,
                stock     INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_offers (
                product_id  TEXT PRIMARY KEY
                            REFERENCES products(id) ON DELETE CASCADE,
                promo_price TEXT NOT NULL,
                valid_until TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    TEXT NOT NULL,
                total      TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS order_items (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id   INTEGER NOT NULL,
                product_id TEXT NOT NULL,
                qty        INTEGER NOT NULL,
                price      TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.name, p.descr, p.image_url, p.price, p.stock,
    o.promo_price, o.valid_until
"#;

#[async_trait]
impl Store for Database {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, name, email FROM users ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| User { id, name, email })
            .collect())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, name, email FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|(id, name, email)| User { id, name, email }))
    }

    async fn user_exists(&self, id: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(row.is_some())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .execute(&*self.pool)
        .await
        .map_err(|e| classify_unique(e, Some("users.email")))?;

        Ok(())
    }

    async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET name  = COALESCE(?2, name),
                   email = COALESCE(?3, email)
             WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .execute(&*self.pool)
        .await
        .map_err(|e| classify_unique(e, Some("users.email")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_products(
        &self,
        name_filter: Option<&str>,
    ) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN product_offers o ON o.product_id = p.id
            WHERE ?1 IS NULL OR instr(lower(p.name), lower(?1)) > 0
            ORDER BY p.id
            "#
        ))
        .bind(name_filter)
        .fetch_all(&*self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN product_offers o ON o.product_id = p.id
            WHERE p.id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend)?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn product_exists(&self, id: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM products WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(row.is_some())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, descr, image_url, price, stock)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.descr)
        .bind(&product.image_url)
        .bind(product.price.to_string())
        .bind(product.stock)
        .execute(&*self.pool)
        .await
        .map_err(|e| classify_unique(e, None))?;

        Ok(())
    }

    async fn patch_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
               SET name      = COALESCE(?2, name),
                   descr     = COALESCE(?3, descr),
                   image_url = COALESCE(?4, image_url),
                   price     = COALESCE(?5, price),
                   stock     = COALESCE(?6, stock)
             WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.descr)
        .bind(&patch.image_url)
        .bind(patch.price.map(|p| p.to_string()))
        .bind(patch.stock)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_product(id).await
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        // The offer row goes with it (ON DELETE CASCADE)
        let result = sqlx::query(
            r#"
            DELETE FROM products WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_offer(
        &self,
        product_id: &str,
        offer: &OfferWrite,
    ) -> Result<Option<Product>, StoreError> {
        if !self.product_exists(product_id).await? {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO product_offers (product_id, promo_price, valid_until)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id) DO UPDATE
                SET promo_price = excluded.promo_price,
                    valid_until = excluded.valid_until
            "#,
        )
        .bind(product_id)
        .bind(offer.promo_price.to_string())
        .bind(offer.valid_until.to_string())
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        self.get_product(product_id).await
    }

    async fn delete_offer(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
        if !self.product_exists(product_id).await? {
            return Ok(None);
        }

        sqlx::query(
            r#"
            DELETE FROM product_offers WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        self.get_product(product_id).await
    }

    async fn create_order(
        &self,
        user_id: &str,
        items: &[OrderItem],
    ) -> Result<Order, StoreError> {
        let total: Decimal = items.iter().map(|i| i.subtotal).sum();

        let result = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total) VALUES (?1, ?2)
            "#,
        )
        .bind(user_id)
        .bind(total.to_string())
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        let order_id = result.last_insert_rowid();

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, qty, price)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(&item.product_id)
            .bind(item.qty)
            .bind(item.price.to_string())
            .execute(&*self.pool)
            .await
            .map_err(backend)?;
        }

        self.get_order(order_id).await?.ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("order {} vanished after insert", order_id))
        })
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, total, created_at FROM orders WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT oi.product_id, oi.qty, oi.price, p.name AS product_name
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.id
            "#,
        )
        .bind(id)
        .fetch_all(&*self.pool)
        .await
        .map_err(backend)?;

        let items = item_rows
            .into_iter()
            .map(OrderItemRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order {
            id: row.id,
            user_id: row.user_id,
            total: parse_decimal(&row.total)?,
            created_at: row.created_at,
            items,
        }))
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.into())
}

/// Map a unique-constraint rejection to the matching domain error. The
/// constraint name in the SQLite message tells a duplicate email apart
/// from a duplicate primary key.
fn classify_unique(e: sqlx::Error, email_constraint: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            if let Some(constraint) = email_constraint {
                if db.message().contains(constraint) {
                    return StoreError::DuplicateEmail;
                }
            }
            return StoreError::DuplicateId;
        }
    }
    StoreError::Backend(e.into())
}

fn parse_decimal(s: &str) -> Result<Decimal, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("corrupt decimal {:?}: {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("corrupt date {:?}: {}", s, e)))
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    descr: Option<String>,
    image_url: Option<String>,
    price: String,
    stock: i64,
    promo_price: Option<String>,
    valid_until: Option<String>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, StoreError> {
        Ok(Product {
            id: self.id,
            name: self.name,
            descr: self.descr,
            image_url: self.image_url,
            price: parse_decimal(&self.price)?,
            stock: self.stock,
            promo_price: self.promo_price.as_deref().map(parse_decimal).transpose()?,
            valid_until: self.valid_until.as_deref().map(parse_date).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: String,
    total: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    qty: i64,
    price: String,
    product_name: Option<String>,
}

impl OrderItemRow {
    fn into_item(self) -> Result<OrderItem, StoreError> {
        let price = parse_decimal(&self.price)?;
        let mut item = OrderItem::new(self.product_id, self.qty, price);
        item.product_name = self.product_name;
        Ok(item)
    }
}
