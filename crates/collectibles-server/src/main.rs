//! Collectibles API Server
//!
//! CRUD over users and products for the collectibles shop, with offers
//! and orders on top.
//!
//! Uses SQLite (embedded) by default; set STORE_BACKEND=memory for an
//! ephemeral in-memory store.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use collectibles_server::config::{load_config, StoreBackend};
use collectibles_server::storage::{Database, MemoryStore, Store};
use collectibles_server::{app, AppState};
use collectibles_types::User;

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "Starting Collectibles API Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, backend={:?}",
        config.bind_address, config.backend
    );

    let store: Arc<dyn Store> = match config.backend {
        StoreBackend::Sqlite => {
            info!("Initializing SQLite database...");
            let db = Database::new(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            info!("SQLite database initialized at: {}", config.database_path);
            Arc::new(db)
        }
        StoreBackend::Memory => {
            info!("Initializing in-memory store...");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_demo {
        seed_demo_users(store.as_ref())
            .await
            .context("Failed to seed demo users")?;
    }

    let state = AppState { store };

    info!("Building HTTP router...");
    let app = app(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn seed_demo_users(store: &dyn Store) -> Result<()> {
    let seeds = [
        User {
            id: "1".to_string(),
            name: "Rafael".to_string(),
            email: "rafael@example.com".to_string(),
        },
        User {
            id: "2".to_string(),
            name: "Sofía".to_string(),
            email: "sofia@example.com".to_string(),
        },
    ];

    for user in seeds {
        if !store.user_exists(&user.id).await? {
            store.insert_user(&user).await?;
            info!("Seeded demo user {}", user.id);
        }
    }
    Ok(())
}
