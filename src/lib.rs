//! hostmon - host telemetry sampling with rolling history.
//!
//! The library samples CPU, memory, disk, CPU temperature and GPU statistics
//! into a flat [`Snapshot`] and keeps fixed-length rolling histories of every
//! metric. OS access goes through [`HostSource`] and [`GpuStatsSource`] so
//! collectors can be built over fake sources in tests.

pub mod bands;
pub mod collector;
pub mod gpu;
pub mod history;
pub mod sensors;
pub mod snapshot;
pub mod system;

pub use bands::{BarStyle, Thresholds, UsageBand};
pub use collector::{
    default_disk_path, system_collector, CollectError, Collector, CollectorSettings,
    SystemCollector,
};
pub use gpu::{parse_gpu_csv, GpuParseError, GpuQueryError, GpuStatsSource, NoGpu, NvidiaSmi};
pub use history::{Histories, RollingHistory, HISTORY_CAPACITY};
pub use sensors::{SensorGroup, SensorMatcher};
pub use snapshot::{DiskSample, GpuSample, NetworkTotals, Snapshot};
pub use system::{DiskMount, DiskUsage, HostSource, SysinfoSource};
