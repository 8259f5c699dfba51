//! brewlog-ui - server-rendered front end for brewlog-api

use anyhow::{Context, Result};
use brewlog_ui::{build_router, BackendClient, UiState};
use clap::Parser;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for brewlog-ui
#[derive(Parser, Debug)]
#[command(name = "brewlog-ui")]
#[command(about = "Front end listing and submitting madurador records")]
#[command(version)]
struct Args {
    /// Base URL of brewlog-api
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "FRONTEND_BACKEND_URL")]
    backend_url: String,

    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1", env = "BREWLOG_UI_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5500", env = "BREWLOG_UI_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brewlog_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting brewlog-ui v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", args.backend_url);

    let state = UiState {
        backend: BackendClient::new(args.backend_url),
    };
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("brewlog-ui listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("brewlog-ui stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}); waiting for Ctrl+C only", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = signal::ctrl_c() => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
