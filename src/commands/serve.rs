//! HTTP server mode: background collection plus Prometheus endpoints.

use anyhow::Context;
use axum::{routing::get, Router};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::commands::{collect_blocking, shutdown_signal};
use crate::config::{Config, DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::csv_log::CsvLogger;
use crate::handlers::{health_handler, history_handler, metrics_handler};
use crate::state::{AppState, SharedState};

/// Starts the background collector and serves until a shutdown signal.
pub async fn command_serve(config: Config) -> anyhow::Result<()> {
    let addr = listen_addr(&config)?;
    let enable_health = config.enable_health.unwrap_or(true);

    let state: SharedState = Arc::new(AppState::new(config)?);
    debug!("All metrics registered successfully");

    let background_task = tokio::spawn(collection_loop(state.clone()));

    let mut app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/history", get(history_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("hostmon listening on http://{}", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                background_task.abort();
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    background_task.abort();
    let _ = background_task.await;

    info!("hostmon stopped gracefully");
    Ok(())
}

/// Socket address from `bind` and `port`; IPv6 binds are accepted as-is.
pub fn listen_addr(config: &Config) -> anyhow::Result<SocketAddr> {
    let bind = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;
    Ok(SocketAddr::new(ip, config.port.unwrap_or(DEFAULT_PORT)))
}

/// Collects on every tick and publishes into the shared cache.
async fn collection_loop(state: SharedState) {
    let period = Duration::from_millis(state.config.interval_ms());
    let mut collector =
        hostmon::system_collector(state.config.collector_settings(), state.config.gpu_command());

    let mut csv = match state.config.csv_log_path() {
        Some(path) => match CsvLogger::open(&path) {
            Ok(logger) => Some(logger),
            Err(e) => {
                warn!("CSV logging disabled, cannot open {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    debug!(
        "Background collection task started with {}ms interval",
        period.as_millis()
    );

    loop {
        ticker.tick().await;
        let started = Instant::now();

        let (returned, result) = match collect_blocking(collector).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Collection task panicked, stopping collection: {}", e);
                return;
            }
        };
        collector = returned;

        match result {
            Ok(snapshot) => {
                if let Some(logger) = csv.as_mut() {
                    if let Err(e) = logger.log(&snapshot) {
                        warn!("Failed to append to {}: {}", logger.path().display(), e);
                    }
                }
                let histories = collector.histories().clone();
                state.metrics.collections_total.inc();
                state
                    .cache
                    .write()
                    .await
                    .record_success(snapshot, histories, started);
                debug!(
                    "Collection completed in {:.3}ms",
                    started.elapsed().as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                error!("Scheduled collection failed: {}", e);
                state
                    .cache
                    .write()
                    .await
                    .record_failure(e.to_string(), started);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::config::resolve_config;
    use clap::Parser;

    #[test]
    fn test_listen_addr_ipv6_bind() {
        let args = Args::parse_from(["hostmon", "--no-config", "serve", "--bind", "::1", "-p", "19216"]);
        let cfg = resolve_config(&args).unwrap();
        let addr = listen_addr(&cfg).unwrap();
        assert_eq!(addr, "[::1]:19216".parse::<SocketAddr>().unwrap());
        assert_eq!(addr.to_string(), "[::1]:19216");
    }

    #[test]
    fn test_listen_addr_defaults() {
        let addr = listen_addr(&Config::default()).unwrap();
        assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], 9216)));
    }

    #[test]
    fn test_listen_addr_rejects_hostname() {
        let cfg = Config {
            bind: Some("localhost".to_string()),
            ..Config::default()
        };
        assert!(listen_addr(&cfg).is_err());
    }
}
