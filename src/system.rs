//! Host metric sources.
//!
//! This module defines the `HostSource` capability the collector reads from,
//! and `SysinfoSource`, the production implementation backed by `sysinfo`
//! and, on unix, `statvfs(3)` for per-path disk usage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use sysinfo::{Components, Disks, Networks, System};

use crate::sensors::{group_component_readings, SensorGroup};
use crate::snapshot::NetworkTotals;

/// A mounted filesystem as listed by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskMount {
    pub device: String,
    pub mount_point: PathBuf,
}

/// Space accounting for one filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    /// Used share of the space visible to unprivileged users.
    ///
    /// Blocks reserved for root count neither as used nor as available, so
    /// a full disk reads 100% even when root could still write to it.
    pub fn percent(&self) -> f32 {
        usage_percent(self.used_bytes, self.used_bytes + self.available_bytes)
    }
}

/// OS readings the collector depends on.
///
/// Methods take `&mut self` because real sources refresh cached state on
/// every read.
pub trait HostSource {
    /// Utilisation since the previous call, 0-100.
    fn cpu_percent(&mut self) -> f32;

    fn cpu_frequency_mhz(&mut self) -> Option<u64>;

    /// Used share of physical memory, 0-100.
    fn memory_percent(&mut self) -> f32;

    /// Installed physical memory in bytes.
    fn memory_total_bytes(&mut self) -> u64;

    fn disk_mounts(&mut self) -> Vec<DiskMount>;

    /// Usage of the filesystem containing `path`.
    fn disk_usage(&mut self, path: &Path) -> io::Result<DiskUsage>;

    /// Temperature readings grouped by sensor chip, in source order.
    fn sensor_groups(&mut self) -> Vec<SensorGroup>;

    fn network_totals(&mut self) -> Option<NetworkTotals>;
}

/// `HostSource` backed by the `sysinfo` crate.
pub struct SysinfoSource {
    system: System,
    disks: Disks,
    components: Components,
    networks: Networks,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline so the first cpu_percent() has something to diff against.
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource for SysinfoSource {
    fn cpu_percent(&mut self) -> f32 {
        self.system.refresh_cpu();
        clamp_percent(self.system.global_cpu_info().cpu_usage())
    }

    fn cpu_frequency_mhz(&mut self) -> Option<u64> {
        self.system
            .cpus()
            .first()
            .map(|cpu| cpu.frequency())
            .filter(|mhz| *mhz > 0)
    }

    fn memory_percent(&mut self) -> f32 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let available = self.system.available_memory();
        usage_percent(total.saturating_sub(available), total)
    }

    fn memory_total_bytes(&mut self) -> u64 {
        self.system.total_memory()
    }

    fn disk_mounts(&mut self) -> Vec<DiskMount> {
        self.disks.refresh_list();
        self.disks
            .list()
            .iter()
            .map(|disk| DiskMount {
                device: disk.name().to_string_lossy().into_owned(),
                mount_point: disk.mount_point().to_path_buf(),
            })
            .collect()
    }

    #[cfg(unix)]
    fn disk_usage(&mut self, path: &Path) -> io::Result<DiskUsage> {
        statvfs_usage(path)
    }

    #[cfg(not(unix))]
    fn disk_usage(&mut self, path: &Path) -> io::Result<DiskUsage> {
        self.disks.refresh();
        let disk = self
            .disks
            .list()
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no mounted disk contains {}", path.display()),
                )
            })?;

        let total = disk.total_space();
        let available = disk.available_space();
        Ok(DiskUsage {
            total_bytes: total,
            used_bytes: total.saturating_sub(available),
            available_bytes: available,
        })
    }

    fn sensor_groups(&mut self) -> Vec<SensorGroup> {
        self.components.refresh();
        group_component_readings(
            self.components
                .list()
                .iter()
                .map(|c| (c.label(), c.temperature())),
        )
    }

    fn network_totals(&mut self) -> Option<NetworkTotals> {
        self.networks.refresh();
        let mut totals = NetworkTotals {
            bytes_sent: 0,
            bytes_recv: 0,
        };
        let mut seen = false;
        for (_name, data) in self.networks.iter() {
            totals.bytes_sent += data.total_transmitted();
            totals.bytes_recv += data.total_received();
            seen = true;
        }
        seen.then_some(totals)
    }
}

/// Reads filesystem usage for `path` via statvfs(3).
///
/// Fails with `PermissionDenied` on mount points the caller cannot stat.
#[cfg(unix)]
pub fn statvfs_usage(path: &Path) -> io::Result<DiskUsage> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: statvfs only writes into the zeroed struct we own.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let fragment = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * fragment;
    let free = stat.f_bfree as u64 * fragment;
    let available = stat.f_bavail as u64 * fragment;

    Ok(DiskUsage {
        total_bytes: total,
        used_bytes: total.saturating_sub(free),
        available_bytes: available,
    })
}

/// `used / total` as a percentage rounded to one decimal, 0 when total is 0.
pub fn usage_percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    clamp_percent((used as f64 / total as f64 * 100.0) as f32)
}

/// Clamps to [0, 100] and rounds to one decimal. NaN reads as 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// CPU model name for display, from /proc/cpuinfo with a sysinfo fallback.
pub fn cpu_model_name() -> String {
    if let Ok(content) = fs::read_to_string("/proc/cpuinfo") {
        if let Some(name) = parse_cpu_model_name(&content) {
            return name;
        }
    }

    let mut system = System::new();
    system.refresh_cpu();
    system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "CPU".to_string())
}

/// Extracts the first `model name` value from /proc/cpuinfo content.
pub fn parse_cpu_model_name(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("model name"))
        .find_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
