//! Snapshot collection and rolling-history aggregation.
//!
//! A `Collector` owns its sources and its histories. Each `collect()` call
//! samples CPU, memory, disk, CPU temperature and GPUs in that order,
//! appends to the histories, and returns a fresh `Snapshot`. Unavailable
//! readings degrade to `None` or are skipped; only malformed GPU tool output
//! is reported as an error.

use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::gpu::{parse_gpu_csv, GpuParseError, GpuQueryError, GpuStatsSource, NoGpu, NvidiaSmi};
use crate::history::{Histories, HISTORY_CAPACITY};
use crate::sensors::SensorMatcher;
use crate::snapshot::{DiskSample, GpuSample, Snapshot};
use crate::system::{clamp_percent, HostSource, SysinfoSource};

/// Errors that abort a collection cycle.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("malformed GPU query output: {0}")]
    GpuOutput(#[from] GpuParseError),
}

/// Tunables for a collector instance.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Path whose filesystem is reported as `disk_percent`.
    pub disk_path: PathBuf,
    pub history_capacity: usize,
    pub sensor_matcher: SensorMatcher,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            disk_path: default_disk_path(),
            history_capacity: HISTORY_CAPACITY,
            sensor_matcher: SensorMatcher::default(),
        }
    }
}

/// Root of the primary volume.
pub fn default_disk_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

/// Collector over the real host with a runtime-selected GPU source.
pub type SystemCollector = Collector<SysinfoSource, Box<dyn GpuStatsSource + Send>>;

/// Builds a collector reading this machine. `gpu_command = None` disables
/// GPU sampling entirely.
pub fn system_collector(settings: CollectorSettings, gpu_command: Option<&str>) -> SystemCollector {
    let gpu: Box<dyn GpuStatsSource + Send> = match gpu_command {
        Some(cmd) => Box::new(NvidiaSmi::new(cmd)),
        None => Box::new(NoGpu),
    };
    Collector::new(SysinfoSource::new(), gpu, settings)
}

pub struct Collector<H, G> {
    host: H,
    gpu: G,
    settings: CollectorSettings,
    histories: Histories,
}

impl<H: HostSource, G: GpuStatsSource> Collector<H, G> {
    pub fn new(host: H, gpu: G, settings: CollectorSettings) -> Self {
        let histories = Histories::new(settings.history_capacity);
        Self {
            host,
            gpu,
            settings,
            histories,
        }
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Instantaneous CPU utilisation since the previous call.
    pub fn sample_cpu(&mut self) -> f32 {
        let usage = clamp_percent(self.host.cpu_percent());
        self.histories.cpu.push(usage);
        usage
    }

    pub fn sample_memory(&mut self) -> f32 {
        let usage = clamp_percent(self.host.memory_percent());
        self.histories.memory.push(usage);
        usage
    }

    /// Usage of the filesystem containing `path`.
    ///
    /// Errors (notably `PermissionDenied`) are returned untouched so a caller
    /// walking several mounts can skip just the failing one. Nothing is
    /// appended on error.
    pub fn sample_disk(&mut self, path: &Path) -> io::Result<f32> {
        let usage = clamp_percent(self.host.disk_usage(path)?.percent());
        self.histories.disk.push(usage);
        Ok(usage)
    }

    /// Samples every mounted disk, skipping mounts that cannot be read.
    pub fn sample_disks(&mut self) -> Vec<DiskSample> {
        let mounts = self.host.disk_mounts();
        let mut samples = Vec::with_capacity(mounts.len());

        for mount in mounts {
            let usage = match self.host.disk_usage(&mount.mount_point) {
                Ok(usage) => usage,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    debug!(
                        "Skipping {} ({}): permission denied",
                        mount.mount_point.display(),
                        mount.device
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Skipping {} ({}): {}",
                        mount.mount_point.display(),
                        mount.device,
                        e
                    );
                    continue;
                }
            };

            let percent = clamp_percent(usage.percent());
            self.histories.push_disk_device(&mount.device, percent);
            samples.push(DiskSample {
                device: mount.device,
                mount_point: mount.mount_point.display().to_string(),
                percent,
                total_bytes: usage.total_bytes,
            });
        }

        samples
    }

    /// Mean of the first sensor group that looks like a CPU, if any.
    ///
    /// The match is a naming heuristic (see `SensorMatcher`) and can miss or
    /// misattribute sensors on unusual hardware.
    pub fn sample_cpu_temperature(&mut self) -> Option<f32> {
        let groups = self.host.sensor_groups();
        let temp = self.settings.sensor_matcher.cpu_temperature(&groups);
        self.histories.cpu_temp.push(temp);
        temp
    }

    /// Queries the GPU tool.
    ///
    /// `Ok(None)` means the tool is missing or failed; `Ok(Some(vec![]))`
    /// means it ran and reported no GPUs.
    ///
    /// The per-cycle first-GPU series gets exactly one entry per call, even
    /// when the output is malformed.
    pub fn sample_gpus(&mut self) -> Result<Option<Vec<GpuSample>>, GpuParseError> {
        let output = match self.gpu.query() {
            Ok(output) => output,
            Err(GpuQueryError::NotFound(cmd)) => {
                debug!("GPU query tool '{}' not available", cmd);
                self.histories.push_primary_gpu(None);
                return Ok(None);
            }
            Err(e) => {
                debug!("GPU query failed: {}", e);
                self.histories.push_primary_gpu(None);
                return Ok(None);
            }
        };

        let gpus = match parse_gpu_csv(&output) {
            Ok(gpus) => gpus,
            Err(e) => {
                self.histories.push_primary_gpu(None);
                return Err(e);
            }
        };
        for gpu in &gpus {
            self.histories.gpu.push(gpu.clone());
        }
        self.histories.push_primary_gpu(gpus.first());
        Ok(Some(gpus))
    }

    /// Runs one full collection cycle.
    pub fn collect(&mut self) -> Result<Snapshot, CollectError> {
        let timestamp = Local::now();

        let cpu_percent = self.sample_cpu();
        let cpu_frequency_mhz = self.host.cpu_frequency_mhz();
        let memory_percent = self.sample_memory();
        let memory_total_bytes = self.host.memory_total_bytes();

        let disk_path = self.settings.disk_path.clone();
        let disk_percent = match self.sample_disk(&disk_path) {
            Ok(percent) => Some(percent),
            Err(e) => {
                warn!("Failed to read disk usage for {}: {}", disk_path.display(), e);
                None
            }
        };
        let disks = self.sample_disks();

        let cpu_temp = self.sample_cpu_temperature();
        let gpus = self.sample_gpus()?;
        let network = self.host.network_totals();

        Ok(Snapshot {
            timestamp,
            cpu_percent,
            cpu_frequency_mhz,
            memory_percent,
            memory_total_bytes,
            disk_percent,
            disks,
            cpu_temp,
            gpus,
            network,
        })
    }
}
