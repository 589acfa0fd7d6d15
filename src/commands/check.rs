//! `check` subcommand: reports what this host can provide.

use hostmon::gpu::GpuQueryError;
use hostmon::system::cpu_model_name;
use hostmon::{parse_gpu_csv, GpuStatsSource, HostSource, NvidiaSmi, SysinfoSource};
use std::io;

use crate::config::{validate_effective_config, Config};

/// Runs the selected checks; exits with status 1 if any of them fail.
pub fn command_check(
    sensors: bool,
    gpu: bool,
    disks: bool,
    all: bool,
    config: &Config,
) -> anyhow::Result<()> {
    println!("🔍 hostmon - System Check");
    println!("=========================");

    let mut host = SysinfoSource::new();
    let settings = config.collector_settings();
    let mut all_ok = true;

    println!("\n🖥️  Host");
    println!("   CPU: {}", cpu_model_name());
    if let Some(mhz) = host.cpu_frequency_mhz() {
        println!("   Clock: {} MHz", mhz);
    }

    if sensors || all {
        println!("\n🌡️  Checking temperature sensors...");
        let groups = host.sensor_groups();
        if groups.is_empty() {
            println!("   ⚠️  No temperature sensors exposed by this host");
        }
        for group in &groups {
            let marker = if settings.sensor_matcher.matches(&group.name) {
                "✅"
            } else {
                "  "
            };
            println!(
                "   {} {} ({} readings)",
                marker,
                group.name,
                group.readings.len()
            );
        }
        match settings.sensor_matcher.cpu_temperature(&groups) {
            Some(temp) => println!("   ✅ CPU temperature: {:.1}°C", temp),
            None => println!(
                "   ⚠️  No group matches prefixes {:?}; CPU temperature will be N/A",
                settings.sensor_matcher.prefixes()
            ),
        }
    }

    if gpu || all {
        println!("\n🎮 Checking GPU query tool...");
        match config.gpu_command() {
            None => println!("   ⚠️  GPU sampling disabled"),
            Some(cmd) => match NvidiaSmi::new(cmd).query() {
                Ok(output) => match parse_gpu_csv(&output) {
                    Ok(gpus) if gpus.is_empty() => {
                        println!("   ⚠️  '{}' ran but reported no GPUs", cmd)
                    }
                    Ok(gpus) => {
                        for (i, g) in gpus.iter().enumerate() {
                            println!(
                                "   ✅ GPU{} {}: {}% | {}/{} MB | {}°C",
                                i,
                                g.name,
                                g.utilization_percent,
                                g.memory_used_mb,
                                g.memory_total_mb,
                                g.temperature_c
                            );
                        }
                    }
                    Err(e) => {
                        println!("   ❌ Unexpected output from '{}': {}", cmd, e);
                        all_ok = false;
                    }
                },
                Err(GpuQueryError::NotFound(_)) => {
                    println!("   ⚠️  '{}' not found; GPU metrics will be unavailable", cmd)
                }
                Err(e) => println!("   ⚠️  {}", e),
            },
        }
    }

    if disks || all {
        println!("\n💾 Checking disks...");
        for mount in host.disk_mounts() {
            match host.disk_usage(&mount.mount_point) {
                Ok(usage) => println!(
                    "   ✅ {} on {}: {:.1}%",
                    mount.device,
                    mount.mount_point.display(),
                    usage.percent()
                ),
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => println!(
                    "   ⚠️  {} on {}: permission denied (skipped)",
                    mount.device,
                    mount.mount_point.display()
                ),
                Err(e) => println!(
                    "   ⚠️  {} on {}: {} (skipped)",
                    mount.device,
                    mount.mount_point.display(),
                    e
                ),
            }
        }
    }

    match host.disk_usage(&settings.disk_path) {
        Ok(usage) => println!(
            "\n📁 Disk path {}: {:.1}%",
            settings.disk_path.display(),
            usage.percent()
        ),
        Err(e) => {
            println!(
                "\n📁 ❌ Disk path {} unreadable: {}",
                settings.disk_path.display(),
                e
            );
            all_ok = false;
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - host is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
