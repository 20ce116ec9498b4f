//! Catalog Server Entry Point
//!
//! Loads configuration, starts the index build and serves the HTTP API.
//! Unless running in debug mode, the listener only opens once the index is
//! ready or the startup timeout has passed.

use std::sync::Arc;

use anyhow::Context;
use catalog_index::{CsvCatalogStore, FastEmbedProvider, IndexBuilder};
use catalog_server::{router, AppState, ServerConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting catalog server v{}", env!("CARGO_PKG_VERSION"));

    let index_config = config.index_config();
    if index_config.credential().is_none() {
        tracing::warn!("HUGGINGFACE_TOKEN not set; gated models will fail to download");
    }
    if !index_config.source.exists() {
        anyhow::bail!("Catalog file not found: {}", index_config.source.display());
    }
    index_config.validate().context("Invalid index configuration")?;

    tracing::info!("Model: {}", index_config.model_id);
    tracing::info!("Catalog: {}", index_config.source.display());

    let mut provider = FastEmbedProvider::new()
        .with_batch_size(index_config.batch_size)
        .with_download_progress(true);
    if let Some(dir) = &config.model_cache_dir {
        provider = provider.with_cache_dir(dir);
    }

    let builder = IndexBuilder::new(
        index_config,
        Arc::new(provider),
        Arc::new(CsvCatalogStore::new()),
    );

    if config.auto_initialize {
        builder.request_initialization(true).await;

        if config.debug {
            tracing::info!("Debug mode: serving while the index builds");
        } else {
            let timeout = config.startup_timeout();
            tracing::info!("Waiting up to {}s for the index", timeout.as_secs());
            if builder.wait_until_ready(timeout).await {
                tracing::info!("Index ready");
            } else {
                let status = builder.status();
                tracing::warn!(
                    "Index not ready at startup ({}, {}%): {}",
                    status.status,
                    status.progress,
                    status.error.as_deref().unwrap_or(&status.message)
                );
            }
        }
    } else {
        tracing::info!("Auto-initialization disabled; call POST /initialize to build the index");
    }

    let ready = builder.is_ready();
    let app = router(AppState::new(builder));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{} (index ready: {})", addr, ready);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server stopped unexpectedly")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
