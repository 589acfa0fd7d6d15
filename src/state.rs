//! Application state management for the HTTP server.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and updated by the background collection task.

use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::metrics::HostMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and the collection task.
pub struct AppState {
    pub registry: Registry,
    pub metrics: HostMetrics,
    pub cache: Arc<RwLock<SnapshotCache>>,
    pub config: Arc<Config>,
    /// Held across gauge update and gather in `/metrics`.
    pub scrape_lock: Mutex<()>,
    pub cpu_model: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let metrics = HostMetrics::new(&registry)?;

        Ok(Self {
            registry,
            metrics,
            cache: Arc::new(RwLock::new(SnapshotCache::default())),
            config: Arc::new(config),
            scrape_lock: Mutex::new(()),
            cpu_model: hostmon::system::cpu_model_name(),
            started_at: Instant::now(),
        })
    }
}
