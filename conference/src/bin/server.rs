//! Conference Central Server
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Connects the configured record store, cache and task queue
//! - Serves the HTTP API and a Prometheus `/metrics` endpoint
//! - Shuts down gracefully on Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! # In-memory backends
//! cargo run --bin server
//!
//! # PostgreSQL + Redis
//! STORE_BACKEND=postgres DATABASE_URL=postgres://localhost/conference \
//! CACHE_BACKEND=redis REDIS_URL=redis://localhost:6379 \
//! cargo run --bin server
//! ```

use anyhow::Context;
use conference_central::{build_router, metrics, AppState, Config, ConferenceApp};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conference_central=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Conference Central...");

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        store = ?config.store.backend,
        cache = ?config.cache.backend,
        port = config.server.port,
        "Configuration loaded"
    );

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    metrics::register_business_metrics();

    let app = ConferenceApp::new(&config)
        .await
        .context("Failed to initialize application")?;
    tracing::info!("✓ Application initialized");

    let router = build_router(AppState::new(app.service()));
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    let metrics_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.metrics_port)
        .parse()
        .context("Invalid HOST/METRICS_PORT")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics_router = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let prometheus = prometheus.clone();
            async move { prometheus.render() }
        }),
    );
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {metrics_addr}"))?;
    let mut metrics_shutdown = shutdown_rx.clone();
    let metrics_server = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_router)
            .with_graceful_shutdown(async move {
                let _ = metrics_shutdown.changed().await;
            })
            .await
    });
    tracing::info!("📊 Prometheus metrics at http://{metrics_addr}/metrics");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let mut api_shutdown = shutdown_rx;
    let api_server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = api_shutdown.changed().await;
            })
            .await
    });
    tracing::info!("🎤 Conference Central listening on http://{addr}");
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c()
        .await
        .context("Unable to listen for shutdown signal")?;
    tracing::info!("Shutting down gracefully...");
    let _ = shutdown_tx.send(true);

    let drain = async {
        for (name, server) in [("api", api_server), ("metrics", metrics_server)] {
            match server.await {
                Ok(Ok(())) => tracing::info!(server = name, "Server stopped"),
                Ok(Err(error)) => tracing::warn!(server = name, error = %error, "Server failed"),
                Err(error) => tracing::warn!(server = name, error = %error, "Server task panicked"),
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(config.server.shutdown_timeout), drain)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.server.shutdown_timeout,
            "Shutdown timed out with requests still in flight"
        );
    }

    tracing::info!("Goodbye");
    Ok(())
}
