//! Cache of the most recent collection for the HTTP server.
//!
//! The background collection task owns the collector; after every cycle it
//! publishes the snapshot and a copy of the rolling histories here so request
//! handlers never touch the collector itself.

use hostmon::{Histories, Snapshot};
use std::time::Instant;

/// Latest collection result with update timing information.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    pub latest: Option<Snapshot>,
    pub histories: Option<Histories>,
    pub last_updated: Option<Instant>,
    pub update_duration_seconds: f64,
    pub update_success: bool,
    pub last_error: Option<String>,
    pub collections_total: u64,
}

impl SnapshotCache {
    /// Stores a successful cycle.
    pub fn record_success(&mut self, snapshot: Snapshot, histories: Histories, started: Instant) {
        self.latest = Some(snapshot);
        self.histories = Some(histories);
        self.last_updated = Some(started);
        self.update_duration_seconds = started.elapsed().as_secs_f64();
        self.update_success = true;
        self.last_error = None;
        self.collections_total += 1;
    }

    /// Marks the last cycle as failed; the previous snapshot stays available.
    pub fn record_failure(&mut self, error: String, started: Instant) {
        self.update_duration_seconds = started.elapsed().as_secs_f64();
        self.update_success = false;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn snapshot() -> Snapshot {
        Snapshot {
            timestamp: Local::now(),
            cpu_percent: 5.0,
            cpu_frequency_mhz: None,
            memory_percent: 20.0,
            memory_total_bytes: 16_000_000_000,
            disk_percent: Some(30.0),
            disks: vec![],
            cpu_temp: None,
            gpus: None,
            network: None,
        }
    }

    #[test]
    fn test_failure_keeps_previous_snapshot() {
        let mut cache = SnapshotCache::default();
        cache.record_success(snapshot(), Histories::default(), Instant::now());
        assert!(cache.update_success);
        assert_eq!(cache.collections_total, 1);

        cache.record_failure("malformed GPU query output".into(), Instant::now());
        assert!(!cache.update_success);
        assert!(cache.latest.is_some());
        assert_eq!(cache.collections_total, 1);
        assert_eq!(cache.last_error.as_deref(), Some("malformed GPU query output"));
    }
}
