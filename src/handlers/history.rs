//! Rolling history endpoint handler.
//!
//! `/history` returns the collector's rolling histories and the latest
//! snapshot as JSON; this is the data a dashboard plots.

use axum::{extract::State, http::StatusCode, Json};
use hostmon::{Histories, Snapshot};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HistoryResponse {
    pub interval_ms: u64,
    pub capacity: usize,
    pub cpu_model: String,
    pub memory_total_bytes: Option<u64>,
    pub latest: Option<Snapshot>,
    pub histories: Histories,
}

/// Handler for the /history endpoint.
#[instrument(skip(state))]
pub async fn history_handler(
    State(state): State<SharedState>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    debug!("Processing /history request");

    let cache = state.cache.read().await;
    let Some(histories) = cache.histories.clone() else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    Ok(Json(HistoryResponse {
        interval_ms: state.config.interval_ms(),
        capacity: histories.capacity(),
        cpu_model: state.cpu_model.clone(),
        memory_total_bytes: cache.latest.as_ref().map(|s| s.memory_total_bytes),
        latest: cache.latest.clone(),
        histories,
    }))
}
