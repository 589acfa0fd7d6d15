//! Plain-text rendering of snapshots for the console driver.

use hostmon::{BarStyle, Snapshot, Thresholds};
use std::fmt::Write as FmtWrite;

const SEPARATOR_WIDTH: usize = 50;

/// Renders one snapshot as the multi-line console block.
pub fn render_snapshot(snapshot: &Snapshot, thresholds: &Thresholds) -> String {
    let mut out = String::new();

    writeln!(out, "Time: {}", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(
        out,
        "CPU Usage: {:.1}%{}",
        snapshot.cpu_percent,
        marker(thresholds, Some(snapshot.cpu_percent))
    )
    .ok();
    if let Some(mhz) = snapshot.cpu_frequency_mhz {
        writeln!(out, "CPU Clock: {} MHz", mhz).ok();
    }
    writeln!(
        out,
        "CPU Temp: {}",
        snapshot
            .cpu_temp
            .map(|t| format!("{:.1}°C", t))
            .unwrap_or_else(|| "N/A".to_string())
    )
    .ok();
    writeln!(
        out,
        "Memory Usage: {:.1}%{}",
        snapshot.memory_percent,
        marker(thresholds, Some(snapshot.memory_percent))
    )
    .ok();
    match snapshot.disk_percent {
        Some(disk) => {
            writeln!(out, "Disk Usage: {:.1}%{}", disk, marker(thresholds, Some(disk))).ok();
        }
        None => {
            writeln!(out, "Disk Usage: N/A").ok();
        }
    }

    match snapshot.gpus.as_deref() {
        Some(gpus) if !gpus.is_empty() => {
            for (i, gpu) in gpus.iter().enumerate() {
                writeln!(
                    out,
                    "GPU{} ({}): {}% | {}/{} MB | Temp: {}°C{}",
                    i,
                    gpu.name,
                    gpu.utilization_percent,
                    gpu.memory_used_mb,
                    gpu.memory_total_mb,
                    gpu.temperature_c,
                    marker(thresholds, Some(gpu.utilization_percent as f32))
                )
                .ok();
            }
        }
        _ => {
            writeln!(out, "No GPU detected or nvidia-smi not available").ok();
        }
    }

    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH)).ok();
    out
}

fn marker(thresholds: &Thresholds, value: Option<f32>) -> &'static str {
    match thresholds.style(value) {
        BarStyle::Normal => "",
        BarStyle::Hot => " [hot]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use hostmon::GpuSample;

    fn snapshot() -> Snapshot {
        Snapshot {
            timestamp: Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
            cpu_percent: 12.5,
            cpu_frequency_mhz: Some(2400),
            memory_percent: 81.0,
            memory_total_bytes: 16_000_000_000,
            disk_percent: None,
            disks: vec![],
            cpu_temp: Some(46.0),
            gpus: None,
            network: None,
        }
    }

    #[test]
    fn test_render_without_gpu() {
        let text = render_snapshot(&snapshot(), &Thresholds::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Time: 2025-03-14 09:26:53",
                "CPU Usage: 12.5%",
                "CPU Clock: 2400 MHz",
                "CPU Temp: 46.0°C",
                "Memory Usage: 81.0% [hot]",
                "Disk Usage: N/A",
                "No GPU detected or nvidia-smi not available",
                "--------------------------------------------------",
            ]
        );
    }

    #[test]
    fn test_render_gpu_lines() {
        let mut snap = snapshot();
        snap.gpus = Some(vec![GpuSample {
            name: "NVIDIA T4".to_string(),
            memory_used_mb: 1024,
            memory_total_mb: 16384,
            utilization_percent: 23,
            temperature_c: 61,
        }]);
        let text = render_snapshot(&snap, &Thresholds::default());
        assert!(text.contains("GPU0 (NVIDIA T4): 23% | 1024/16384 MB | Temp: 61°C\n"));
    }

    #[test]
    fn test_whole_percentages_keep_one_decimal() {
        let mut snap = snapshot();
        snap.cpu_percent = 1.0;
        snap.disk_percent = Some(44.0);
        let text = render_snapshot(&snap, &Thresholds::default());
        assert!(text.contains("CPU Usage: 1.0%\n"));
        assert!(text.contains("Disk Usage: 44.0%\n"));
    }

    #[test]
    fn test_empty_gpu_list_reads_as_no_gpu() {
        let mut snap = snapshot();
        snap.gpus = Some(vec![]);
        let text = render_snapshot(&snap, &Thresholds::default());
        assert!(text.contains("No GPU detected"));
    }
}
