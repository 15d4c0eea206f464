//! Environment-driven configuration

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Which store implementation backs the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub backend: StoreBackend,
    pub database_path: String,
    pub data_dir: PathBuf,
    pub seed_demo: bool,
}

pub async fn load_config() -> Result<Config> {
    info!("Loading configuration from environment...");

    let backend = match std::env::var("STORE_BACKEND") {
        Ok(value) => match value.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "sqlite" => StoreBackend::Sqlite,
            other => anyhow::bail!("Unknown STORE_BACKEND: {}", other),
        },
        Err(_) => StoreBackend::Sqlite,
    };

    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    if backend == StoreBackend::Sqlite {
        info!("Data directory: {}", data_dir.display());
        if let Err(e) = tokio::fs::create_dir_all(&data_dir).await {
            return Err(anyhow::anyhow!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ));
        }
    }

    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        let path = data_dir.join("collectibles.db");
        path.to_string_lossy().to_string()
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:4567".to_string());

    let seed_demo = std::env::var("SEED_DEMO")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    Ok(Config {
        bind_address,
        backend,
        database_path,
        data_dir,
        seed_demo,
    })
}
