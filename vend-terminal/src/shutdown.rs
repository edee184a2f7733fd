//! Signal handling for graceful shutdown.

use std::sync::Arc;
use tokio::sync::watch;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). Where SIGTERM is unavailable
/// only Ctrl+C is watched.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    }
                    _ = ctrl_c() => {}
                }
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
            }
        }
    }

    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT, initiating graceful shutdown"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Spawns a task that flips `shutdown_tx` to `true` on the first shutdown
/// signal.
pub fn spawn_signal_handler(shutdown_tx: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_tx.send_replace(true);
    });
}
