//! CLI command implementations for hostmon.
//!
//! This module provides implementations for all CLI subcommands:
//! - `watch`: Console output loop (default)
//! - `serve`: HTTP server with Prometheus metrics and history
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `test`: One-shot collection

pub mod check;
pub mod config;
pub mod serve;
pub mod test;
pub mod watch;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use serve::command_serve;
pub use test::command_test;
pub use watch::command_watch;

use hostmon::{CollectError, Snapshot, SystemCollector};
use tokio::signal;
use tokio::task::JoinError;
use tracing::info;

/// Runs one collection cycle on the blocking pool.
///
/// The collector is moved in and handed back so the caller keeps ownership
/// between cycles. The GPU query spawns a process and must not block the
/// runtime.
pub async fn collect_blocking(
    mut collector: SystemCollector,
) -> Result<(SystemCollector, Result<Snapshot, CollectError>), JoinError> {
    tokio::task::spawn_blocking(move || {
        let result = collector.collect();
        (collector, result)
    })
    .await
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
