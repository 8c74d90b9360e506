mod aggregate;
mod api;
mod cache;
mod config;
mod document;
mod registry;
mod registry_manager;
mod service;
mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use crate::aggregate::Aggregator;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::registry::store::ServiceStore;
use crate::registry_manager::RegistryHandle;
use crate::transport::HttpTransport;

const DEFAULT_CONFIG_PATH: &str = "/etc/mix/mixd.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mixd=info"))
        )
        .init();

    tracing::info!("Starting mixd");

    let config = load_config()?;

    // The registry lives in memory only; every start begins empty
    let registry = RegistryHandle::spawn(ServiceStore::new());

    let cache = Arc::new(TtlCache::new());
    let transport = HttpTransport::new(config.upstream.timeout_secs.map(Duration::from_secs))?;
    let aggregator = Aggregator::new(registry.clone(), Arc::clone(&cache), Arc::new(transport));

    let cancel = CancellationToken::new();

    let maintenance_cancel = cancel.clone();
    let maintenance_cache = Arc::clone(&cache);
    let maintenance_config = config.cache.clone();
    let maintenance_handle = tokio::spawn(async move {
        if let Err(e) = cache::maintenance::run(maintenance_cache, maintenance_config, maintenance_cancel).await {
            tracing::error!("Cache maintenance error: {}", e);
        }
    });

    let app_state = api::routes::AppState {
        registry: registry.clone(),
        aggregator: Arc::new(aggregator),
    };
    let app = api::routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("API listening on {}", config.api.listen);

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    cancel.cancel();

    let (maintenance_result, server_result) = tokio::join!(maintenance_handle, server_handle);
    for result in [maintenance_result, server_result] {
        if let Err(e) = result {
            tracing::error!("Task did not finish cleanly: {}", e);
        }
    }

    if let Err(e) = registry.shutdown().await {
        tracing::error!("Failed to shutdown registry: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Config path is the first argument. Without one, the default path is used
/// if present and built-in defaults otherwise.
fn load_config() -> Result<Config> {
    if let Some(path) = std::env::args().nth(1) {
        let config = Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path))?;
        tracing::info!("Loaded config from {}", path);
        return Ok(config);
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        let config = Config::load(DEFAULT_CONFIG_PATH)?;
        tracing::info!("Loaded config from {}", DEFAULT_CONFIG_PATH);
        return Ok(config);
    }

    tracing::info!("No config file at {}; using defaults", DEFAULT_CONFIG_PATH);
    Ok(Config::default())
}
