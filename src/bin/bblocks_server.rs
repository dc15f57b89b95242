//! bblocks_server: building block register lookup service.
//!
//! Configuration comes from env vars (see `bblocks_api::config`). Startup
//! fetches the register once, bounded by `BBLOCKS_STARTUP_TIMEOUT_SECS`, then
//! serves while a background task refreshes it every
//! `BBLOCKS_REFRESH_INTERVAL_SECS`.
//!
//! ```bash
//! BBLOCKS_REGISTER_BASE_URL=https://opengeospatial.github.io/bblocks/ \
//!   cargo run --bin bblocks_server
//!
//! curl http://localhost:8000/list
//! curl -i 'http://localhost:8000/bb/ogc.geo.features.feature?_mediatype=application/schema+json'
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use bblocks_api::api::{build_router, AppState};
use bblocks_api::catalog::refresher::http_client;
use bblocks_api::catalog::{CatalogRefresher, CatalogStore};
use bblocks_api::config::ServiceConfig;
use bblocks_api::resolver::Resolver;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bblocks_api=debug,bblocks_server=debug".into()),
        )
        .init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let catalog_url = config.catalog_url()?;
    tracing::info!(
        catalog = %catalog_url,
        profile = config.profile.as_str(),
        docs = ?config.docs_strategy,
        schema_delivery = ?config.schema_delivery,
        "Loaded configuration"
    );

    let client = http_client(config.fetch_timeout).context("failed to create HTTP client")?;
    let store = Arc::new(CatalogStore::new());
    let refresher = Arc::new(CatalogRefresher::new(
        client.clone(),
        catalog_url,
        Arc::clone(&store),
    ));

    // Failure here is logged by the refresher; serve with an empty catalog.
    let _ = refresher.initial_refresh(config.startup_timeout).await;
    Arc::clone(&refresher).spawn_periodic(config.refresh_interval);

    let resolver = Resolver::new(
        config.media_types(),
        config.docs_strategy,
        config.register_base_url.clone(),
    );
    let state = AppState::new(store, resolver, client, config.schema_delivery);
    let app = build_router(state, &config.root_path);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!(
        "bblocks_server listening on {}{}",
        config.bind_addr,
        config.root_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("bblocks_server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
