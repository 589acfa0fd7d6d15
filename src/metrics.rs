//! Prometheus metrics definitions for hostmon.
//!
//! This module defines the gauges exported by `serve` and how a snapshot is
//! mapped onto them. Readings that are absent from a snapshot are left unset
//! rather than exported as zero.

use hostmon::Snapshot;
use prometheus::{Gauge, GaugeVec, IntCounter, Opts, Registry};

use crate::cache::SnapshotCache;

const NO_LABELS: &[&str] = &[];

/// Collection of Prometheus metrics for host monitoring.
#[derive(Clone)]
pub struct HostMetrics {
    pub cpu_usage: Gauge,
    pub cpu_frequency: GaugeVec,
    pub cpu_temperature: GaugeVec,
    pub memory_usage: Gauge,
    pub memory_total: Gauge,

    // Disk usage
    pub primary_disk_usage: GaugeVec,
    pub disk_usage: GaugeVec,
    pub disk_total: GaugeVec,

    // GPU metrics, one series per GPU index
    pub gpu_available: Gauge,
    pub gpu_utilization: GaugeVec,
    pub gpu_memory_used: GaugeVec,
    pub gpu_memory_total: GaugeVec,
    pub gpu_temperature: GaugeVec,

    // Network totals
    pub network_sent: GaugeVec,
    pub network_recv: GaugeVec,

    // Collector health
    pub collect_duration: Gauge,
    pub collect_success: Gauge,
    pub collections_total: IntCounter,
}

impl HostMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let cpu_usage = Gauge::new("hostmon_cpu_usage_percent", "Global CPU utilisation in percent")?;
        let cpu_frequency = GaugeVec::new(
            Opts::new("hostmon_cpu_frequency_mhz", "Current frequency of the first CPU in MHz"),
            NO_LABELS,
        )?;
        let cpu_temperature = GaugeVec::new(
            Opts::new(
                "hostmon_cpu_temperature_celsius",
                "Mean temperature of the first matching CPU sensor group",
            ),
            NO_LABELS,
        )?;
        let memory_usage = Gauge::new(
            "hostmon_memory_usage_percent",
            "Used share of physical memory in percent",
        )?;
        let memory_total = Gauge::new(
            "hostmon_memory_total_bytes",
            "Installed physical memory in bytes",
        )?;

        let primary_disk_usage = GaugeVec::new(
            Opts::new(
                "hostmon_primary_disk_usage_percent",
                "Usage of the filesystem containing the configured disk path",
            ),
            &["path"],
        )?;
        let disk_usage = GaugeVec::new(
            Opts::new("hostmon_disk_usage_percent", "Usage per mounted disk in percent"),
            &["device", "mount"],
        )?;
        let disk_total = GaugeVec::new(
            Opts::new("hostmon_disk_total_bytes", "Capacity per mounted disk in bytes"),
            &["device", "mount"],
        )?;

        let gpu_available = Gauge::new(
            "hostmon_gpu_query_available",
            "Whether the GPU query tool ran successfully (1) or not (0)",
        )?;
        let gpu_utilization = GaugeVec::new(
            Opts::new("hostmon_gpu_utilization_percent", "GPU utilisation in percent"),
            &["index", "name"],
        )?;
        let gpu_memory_used = GaugeVec::new(
            Opts::new("hostmon_gpu_memory_used_megabytes", "GPU memory in use in MB"),
            &["index", "name"],
        )?;
        let gpu_memory_total = GaugeVec::new(
            Opts::new("hostmon_gpu_memory_total_megabytes", "GPU memory capacity in MB"),
            &["index", "name"],
        )?;
        let gpu_temperature = GaugeVec::new(
            Opts::new("hostmon_gpu_temperature_celsius", "GPU core temperature"),
            &["index", "name"],
        )?;

        let network_sent = GaugeVec::new(
            Opts::new(
                "hostmon_network_sent_bytes",
                "Bytes sent across all interfaces since boot",
            ),
            NO_LABELS,
        )?;
        let network_recv = GaugeVec::new(
            Opts::new(
                "hostmon_network_received_bytes",
                "Bytes received across all interfaces since boot",
            ),
            NO_LABELS,
        )?;

        let collect_duration = Gauge::new(
            "hostmon_collect_duration_seconds",
            "Time spent in the last collection cycle",
        )?;
        let collect_success = Gauge::new(
            "hostmon_collect_success",
            "Whether the last collection cycle succeeded (1) or failed (0)",
        )?;
        let collections_total = IntCounter::new(
            "hostmon_collections_total",
            "Number of successful collection cycles since start",
        )?;

        registry.register(Box::new(cpu_usage.clone()))?;
        registry.register(Box::new(cpu_frequency.clone()))?;
        registry.register(Box::new(cpu_temperature.clone()))?;
        registry.register(Box::new(memory_usage.clone()))?;
        registry.register(Box::new(memory_total.clone()))?;

        registry.register(Box::new(primary_disk_usage.clone()))?;
        registry.register(Box::new(disk_usage.clone()))?;
        registry.register(Box::new(disk_total.clone()))?;

        registry.register(Box::new(gpu_available.clone()))?;
        registry.register(Box::new(gpu_utilization.clone()))?;
        registry.register(Box::new(gpu_memory_used.clone()))?;
        registry.register(Box::new(gpu_memory_total.clone()))?;
        registry.register(Box::new(gpu_temperature.clone()))?;

        registry.register(Box::new(network_sent.clone()))?;
        registry.register(Box::new(network_recv.clone()))?;

        registry.register(Box::new(collect_duration.clone()))?;
        registry.register(Box::new(collect_success.clone()))?;
        registry.register(Box::new(collections_total.clone()))?;

        Ok(Self {
            cpu_usage,
            cpu_frequency,
            cpu_temperature,
            memory_usage,
            memory_total,
            primary_disk_usage,
            disk_usage,
            disk_total,
            gpu_available,
            gpu_utilization,
            gpu_memory_used,
            gpu_memory_total,
            gpu_temperature,
            network_sent,
            network_recv,
            collect_duration,
            collect_success,
            collections_total,
        })
    }

    /// Drops all labelled series (used before updating with fresh data).
    pub fn reset(&self) {
        self.cpu_frequency.reset();
        self.cpu_temperature.reset();

        self.primary_disk_usage.reset();
        self.disk_usage.reset();
        self.disk_total.reset();

        self.gpu_utilization.reset();
        self.gpu_memory_used.reset();
        self.gpu_memory_total.reset();
        self.gpu_temperature.reset();

        self.network_sent.reset();
        self.network_recv.reset();
    }

    /// Sets every gauge from the cache contents.
    ///
    /// Resets labelled series first, so callers sharing one registry must
    /// serialize update and gather (see `AppState::scrape_lock`).
    /// `collections_total` is incremented by the collection task instead.
    pub fn update_from_cache(&self, cache: &SnapshotCache, disk_path: &str) {
        self.collect_duration.set(cache.update_duration_seconds);
        self.collect_success
            .set(if cache.update_success { 1.0 } else { 0.0 });

        self.reset();
        if let Some(snapshot) = &cache.latest {
            self.set_snapshot(snapshot, disk_path);
        }
    }

    fn set_snapshot(&self, snapshot: &Snapshot, disk_path: &str) {
        self.cpu_usage.set(snapshot.cpu_percent as f64);
        self.memory_usage.set(snapshot.memory_percent as f64);
        self.memory_total.set(snapshot.memory_total_bytes as f64);

        if let Some(mhz) = snapshot.cpu_frequency_mhz {
            self.cpu_frequency.with_label_values(NO_LABELS).set(mhz as f64);
        }
        if let Some(temp) = snapshot.cpu_temp {
            self.cpu_temperature.with_label_values(NO_LABELS).set(temp as f64);
        }

        if let Some(disk) = snapshot.disk_percent {
            self.primary_disk_usage
                .with_label_values(&[disk_path])
                .set(disk as f64);
        }
        for disk in &snapshot.disks {
            let labels = [disk.device.as_str(), disk.mount_point.as_str()];
            self.disk_usage
                .with_label_values(&labels)
                .set(disk.percent as f64);
            self.disk_total
                .with_label_values(&labels)
                .set(disk.total_bytes as f64);
        }

        match &snapshot.gpus {
            Some(gpus) => {
                self.gpu_available.set(1.0);
                for (idx, gpu) in gpus.iter().enumerate() {
                    let index = idx.to_string();
                    let labels = [index.as_str(), gpu.name.as_str()];
                    self.gpu_utilization
                        .with_label_values(&labels)
                        .set(gpu.utilization_percent as f64);
                    self.gpu_memory_used
                        .with_label_values(&labels)
                        .set(gpu.memory_used_mb as f64);
                    self.gpu_memory_total
                        .with_label_values(&labels)
                        .set(gpu.memory_total_mb as f64);
                    self.gpu_temperature
                        .with_label_values(&labels)
                        .set(gpu.temperature_c as f64);
                }
            }
            None => self.gpu_available.set(0.0),
        }

        if let Some(net) = snapshot.network {
            self.network_sent.with_label_values(NO_LABELS).set(net.bytes_sent as f64);
            self.network_recv.with_label_values(NO_LABELS).set(net.bytes_recv as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use hostmon::{GpuSample, Histories};
    use prometheus::{Encoder, TextEncoder};
    use std::time::Instant;

    fn encode(registry: &Registry) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            timestamp: Local::now(),
            cpu_percent: 37.5,
            cpu_frequency_mhz: None,
            memory_percent: 61.2,
            memory_total_bytes: 16_000_000_000,
            disk_percent: Some(44.0),
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

    #[test]
    fn test_snapshot_exported() {
        let registry = Registry::new();
        let metrics = HostMetrics::new(&registry).unwrap();
        let mut cache = SnapshotCache::default();
        cache.record_success(snapshot(), Histories::default(), Instant::now());

        metrics.update_from_cache(&cache, "/");
        let text = encode(&registry);

        assert!(text.contains("hostmon_cpu_usage_percent 37.5"));
        assert!(text.contains("hostmon_primary_disk_usage_percent{path=\"/\"} 44"));
        assert!(text.contains("hostmon_gpu_temperature_celsius{index=\"0\",name=\"NVIDIA T4\"} 61"));
        assert!(text.contains("hostmon_collect_success 1"));
        assert!(text.contains("hostmon_memory_total_bytes 16000000000"));
    }

    #[test]
    fn test_collections_total_is_a_counter() {
        let registry = Registry::new();
        let metrics = HostMetrics::new(&registry).unwrap();
        metrics.collections_total.inc();
        metrics.collections_total.inc();

        let text = encode(&registry);
        assert!(text.contains("# TYPE hostmon_collections_total counter"));
        assert!(text.contains("\nhostmon_collections_total 2\n"));
    }

    #[test]
    fn test_missing_readings_are_not_exported() {
        let registry = Registry::new();
        let metrics = HostMetrics::new(&registry).unwrap();
        let mut cache = SnapshotCache::default();
        let mut snap = snapshot();
        snap.gpus = None;
        cache.record_success(snap, Histories::default(), Instant::now());

        metrics.update_from_cache(&cache, "/");
        let text = encode(&registry);

        assert!(!text.contains("\nhostmon_cpu_temperature_celsius "));
        assert!(!text.contains("hostmon_gpu_utilization_percent{"));
        assert!(text.contains("hostmon_gpu_query_available 0"));
    }
}
