//! Undo Buffer - HTTP service exposing the message, file and image stores.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use undo_buffer::{api::create_router, spawn_cleanup_task, AppState, Config, UndoBuffer};

/// Main entry point for the undo buffer server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Open blob directories and build the stores
/// 4. Start background retention cleanup task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "undo_buffer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Undo Buffer Server");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: capacities messages={} files={} images={}, retention={}ms, thumbnail={}x{}, port={}, cleanup_interval={}s",
        config.message_capacity,
        config.file_capacity,
        config.image_capacity,
        config.retention_period_ms,
        config.thumbnail_width,
        config.thumbnail_height,
        config.server_port,
        config.cleanup_interval
    );

    let state = AppState::from_config(&config)
        .await
        .context("failed to initialize stores")?;
    info!(
        "Stores initialized (files in {}, images in {})",
        config.file_storage_dir, config.image_storage_dir
    );

    let cleanup_handle = spawn_cleanup_task(state.undo.clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let undo = state.undo.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(undo, cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task, cancels blob I/O and allows
/// graceful shutdown.
async fn shutdown_signal(undo: Arc<UndoBuffer>, cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the cleanup task
    cleanup_handle.abort();
    warn!("Cleanup task aborted");

    undo.shutdown();
    warn!("Blob I/O cancelled");
}
