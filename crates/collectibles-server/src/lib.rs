//! Collectibles API server library
//!
//! CRUD over `users` and `products` (plus offers and orders), backed by
//! SQLite (embedded) or a concurrent in-memory map. The binary wires a
//! store into [`AppState`] and serves [`app`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod storage;

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use storage::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

/// Build the full router with middleware layers applied.
///
/// Plain `OPTIONS /{resource}/{id}` requests reach the existence probes;
/// CORS preflights (which carry `Access-Control-Request-Method`) are
/// answered by the CORS layer before routing.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Users
        .route("/users", get(handlers::users::list))
        .route(
            "/users/:id",
            get(handlers::users::get)
                .post(handlers::users::create)
                .put(handlers::users::update)
                .delete(handlers::users::delete)
                .options(handlers::users::probe),
        )
        // Products
        .route("/products", get(handlers::products::list))
        .route(
            "/products/:id",
            get(handlers::products::get)
                .post(handlers::products::create)
                .put(handlers::products::update)
                .delete(handlers::products::delete)
                .options(handlers::products::probe),
        )
        .route(
            "/products/:id/offer",
            put(handlers::products::upsert_offer).delete(handlers::products::delete_offer),
        )
        // Orders
        .route("/orders", post(handlers::orders::create))
        .route("/orders/:id", get(handlers::orders::get))
        // Layers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
