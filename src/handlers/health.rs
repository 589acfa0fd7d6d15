//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports whether
//! the background collection is producing snapshots.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::cache::SnapshotCache;
use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let cache = state.cache.read().await;
    let (status, body) = render_health(&cache, state.started_at.elapsed().as_secs());

    debug!("Health check: {}", status);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        body,
    )
}

/// Derives HTTP status and a plain-text report from the cache state.
pub fn render_health(cache: &SnapshotCache, uptime_seconds: u64) -> (StatusCode, String) {
    let status = if cache.update_success && cache.last_updated.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let message = match (&cache.last_error, cache.last_updated) {
        (Some(_), _) => "Last collection failed",
        (None, None) => "Waiting for first collection",
        (None, Some(_)) => "OK",
    };

    let mut out = String::new();
    writeln!(out, "{message}").ok();
    writeln!(out).ok();
    writeln!(out, "{:28} | {:>12}", "Field", "Value").ok();
    writeln!(out, "{}", "-".repeat(43)).ok();
    writeln!(out, "{:28} | {:>12}", "uptime_seconds", uptime_seconds).ok();
    writeln!(out, "{:28} | {:>12}", "collections_total", cache.collections_total).ok();
    writeln!(
        out,
        "{:28} | {:>12.3}",
        "last_collect_duration_ms",
        cache.update_duration_seconds * 1000.0
    )
    .ok();

    if let Some(snapshot) = &cache.latest {
        writeln!(
            out,
            "{:28} | {:>12}",
            "last_snapshot",
            snapshot.timestamp.format("%H:%M:%S")
        )
        .ok();
        let gpu = match &snapshot.gpus {
            Some(gpus) => gpus.len().to_string(),
            None => "N/A".to_string(),
        };
        writeln!(out, "{:28} | {:>12}", "gpus", gpu).ok();
    }

    if let Some(err) = &cache.last_error {
        writeln!(out).ok();
        writeln!(out, "Last error: {err}").ok();
    }

    (status, out)
}
