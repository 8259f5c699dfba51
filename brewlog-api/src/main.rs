//! brewlog-api - record-management backend for madurador and lote documents
//!
//! Configuration: command line → environment → TOML file → defaults
//! (see `brewlog_common::config`).

use anyhow::{Context, Result};
use brewlog_api::{build_router, cors_layer, AppState};
use brewlog_common::config::ConfigArgs;
use brewlog_common::RecordStore;
use clap::Parser;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for brewlog-api
#[derive(Parser, Debug)]
#[command(name = "brewlog-api")]
#[command(about = "Record-management backend for maduradores and lotes")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "brewlog_api=debug,brewlog_common=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting brewlog-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = args
        .config
        .resolve()
        .context("Failed to resolve configuration")?;

    let store = RecordStore::connect(&config.store)
        .await
        .context("Failed to initialize record store")?;
    info!(
        "Collections: maduradores={} lotes={} (timeout {} ms)",
        config.store.maduradores_collection,
        config.store.lotes_collection,
        config.store.timeout.as_millis()
    );

    let app = build_router(AppState::new(store))
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("brewlog-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
