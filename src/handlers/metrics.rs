//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler that maps the latest
//! cached snapshot onto gauges and returns them in Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    let disk_path = state
        .config
        .collector_settings()
        .disk_path
        .display()
        .to_string();

    let families = {
        let _scrape = state.scrape_lock.lock().await;
        let cache = state.cache.read().await;
        state.metrics.update_from_cache(&cache, &disk_path);
        state.registry.gather()
    };
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if encoder.encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    debug!(
        "Metrics request completed: {} bytes, {:.3}ms",
        buffer.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::AppState;
    use chrono::Local;
    use hostmon::{GpuSample, Histories, Snapshot};
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        Snapshot {
            timestamp: Local::now(),
            cpu_percent: 10.0,
            cpu_frequency_mhz: None,
            memory_percent: 20.0,
            memory_total_bytes: 8_000_000_000,
            disk_percent: Some(30.0),
            disks: vec![],
            cpu_temp: None,
            gpus: Some(vec![GpuSample {
                name: "NVIDIA T4".to_string(),
                memory_used_mb: 1024,
                memory_total_mb: 16384,
                utilization_percent: 23,
                temperature_c: 61,
            }]),
            network: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scrapes_see_labelled_series() {
        let state: SharedState = Arc::new(AppState::new(Config::default()).unwrap());
        state
            .cache
            .write()
            .await
            .record_success(snapshot(), Histories::default(), Instant::now());

        let scrapes: Vec<_> = (0..16)
            .map(|_| tokio::spawn(metrics_handler(State(state.clone()))))
            .collect();

        for scrape in scrapes {
            let body = scrape.await.unwrap().unwrap();
            assert!(body.contains("hostmon_gpu_utilization_percent{index=\"0\",name=\"NVIDIA T4\"} 23"));
        }
    }
}
