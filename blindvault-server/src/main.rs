//! `BlindVault` search server.
//!
//! Loads both vault keys at startup and exits immediately if either is
//! missing or malformed.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use blindvault::search::SearchEngine;
use blindvault::store::SqliteStore;
use blindvault_server::config::ServerConfig;
use blindvault_server::{router, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::parse();

    let keys = config.load_keys().context("failed to load vault keys")?;
    info!("encryption and index keys loaded");

    let store = SqliteStore::open(&config.database)
        .with_context(|| format!("failed to open database {}", config.database.display()))?;
    info!(database = %store.path().display(), "record store ready");

    let app = router(AppState::new(SearchEngine::from_keys(keys, store)));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(address = %config.bind, "secure search endpoint listening on /secure-search");

    axum::serve(listener, app).await?;
    Ok(())
}
