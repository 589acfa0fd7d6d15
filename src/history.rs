//! Fixed-capacity rolling histories for sampled metrics.
//!
//! Every metric the collector samples is also appended to a FIFO buffer so
//! drivers can plot the last N cycles. Buffers are owned by the collector
//! instance; there is no process-wide state.

use ahash::AHashMap as HashMap;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

use crate::snapshot::GpuSample;

/// Default number of samples kept per metric.
pub const HISTORY_CAPACITY: usize = 60;

/// FIFO buffer that silently drops the oldest entry on overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingHistory<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RollingHistory<T> {
    /// Creates an empty history. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended value.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest-first iterator.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> RollingHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T> Default for RollingHistory<T> {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl<T: Serialize> Serialize for RollingHistory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

/// All rolling histories maintained by a collector.
#[derive(Debug, Clone, Serialize)]
pub struct Histories {
    pub cpu: RollingHistory<f32>,
    /// One entry per cycle; `None` when no CPU sensor was readable.
    pub cpu_temp: RollingHistory<Option<f32>>,
    pub memory: RollingHistory<f32>,
    /// Usage of the configured primary path.
    pub disk: RollingHistory<f32>,
    /// Per-device usage, keyed by device name. Created on first sight.
    pub disks: HashMap<String, RollingHistory<f32>>,
    /// Every parsed GPU record, in enumeration order within a cycle.
    pub gpu: RollingHistory<GpuSample>,
    /// First GPU's utilisation, one entry per cycle; 0 without a GPU.
    pub gpu_load: RollingHistory<u32>,
    /// First GPU's temperature, one entry per cycle.
    pub gpu_temp: RollingHistory<Option<i32>>,
    #[serde(skip)]
    capacity: usize,
}

impl Histories {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cpu: RollingHistory::new(capacity),
            cpu_temp: RollingHistory::new(capacity),
            memory: RollingHistory::new(capacity),
            disk: RollingHistory::new(capacity),
            disks: HashMap::new(),
            gpu: RollingHistory::new(capacity),
            gpu_load: RollingHistory::new(capacity),
            gpu_temp: RollingHistory::new(capacity),
            capacity,
        }
    }

    /// Appends a device reading, creating the device's history if needed.
    pub fn push_disk_device(&mut self, device: &str, percent: f32) {
        let capacity = self.capacity;
        self.disks
            .entry(device.to_string())
            .or_insert_with(|| RollingHistory::new(capacity))
            .push(percent);
    }

    /// Appends this cycle's first-GPU reading, or 0 / `None` without one.
    pub fn push_primary_gpu(&mut self, gpu: Option<&GpuSample>) {
        self.gpu_load
            .push(gpu.map_or(0, |g| g.utilization_percent));
        self.gpu_temp.push(gpu.map(|g| g.temperature_c));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Histories {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
