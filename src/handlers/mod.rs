//! HTTP endpoint handlers for the server.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint
//! - `/history`: Rolling history as JSON

pub mod health;
pub mod history;
pub mod metrics;

// Re-export handlers
pub use health::health_handler;
pub use history::history_handler;
pub use metrics::metrics_handler;
