//! Snapshot records produced by one collection cycle.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One GPU as reported by the query tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuSample {
    pub name: String,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub utilization_percent: u32,
    pub temperature_c: i32,
}

/// Usage of one mounted disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    pub device: String,
    pub mount_point: String,
    pub percent: f32,
    pub total_bytes: u64,
}

/// Cumulative bytes moved across all network interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTotals {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Flat record of everything sampled in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Local>,
    pub cpu_percent: f32,
    pub cpu_frequency_mhz: Option<u64>,
    pub memory_percent: f32,
    pub memory_total_bytes: u64,
    /// Usage of the primary path; `None` when it could not be read.
    pub disk_percent: Option<f32>,
    pub disks: Vec<DiskSample>,
    pub cpu_temp: Option<f32>,
    /// `None` when the GPU tool is unavailable; empty when it reported no GPUs.
    pub gpus: Option<Vec<GpuSample>>,
    pub network: Option<NetworkTotals>,
}

impl Snapshot {
    /// First GPU, which is what single-GPU displays and the CSV log show.
    pub fn primary_gpu(&self) -> Option<&GpuSample> {
        self.gpus.as_ref().and_then(|g| g.first())
    }
}
