//! Mini KV - A single-node key-value server
//!
//! LRU cache over an in-memory store with a write-ahead transaction log.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_kv::api::create_router;
use mini_kv::{spawn_log_monitor, AppState, Config};

/// Main entry point for the Mini KV server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the transaction log and replay it into the cache and store
/// 4. Start the log writer monitor
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, then flush the log
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_kv=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini KV Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}, log_path={}, log_buffer={}, port={}, throttle={:?}",
        config.cache_capacity,
        config.log_path.display(),
        config.log_buffer,
        config.server_port,
        config.throttle
    );

    // Replay must finish before any traffic is accepted
    let state = AppState::from_config(&config).with_context(|| {
        format!(
            "failed to restore state from transaction log {}",
            config.log_path.display()
        )
    })?;
    info!(
        "Service ready: {} cached entries, last sequence {}",
        state.service.stats().entries,
        state.service.last_sequence()
    );

    let monitor_handle = spawn_log_monitor(state.service.log_errors());

    let service = state.service.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(monitor_handle))
        .await
        .context("server error")?;

    match service.shutdown().await {
        Ok(last_sequence) => info!("Transaction log closed at sequence {}", last_sequence),
        Err(err) => error!("Transaction log did not close cleanly: {}", err),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the log monitor and allows graceful shutdown.
async fn shutdown_signal(monitor_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
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
                error!("Failed to install SIGTERM handler: {}", err);
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

    monitor_handle.abort();
    warn!("Log monitor aborted");
}
