//! `test` subcommand: collects a few snapshots and dumps them.

use hostmon::Snapshot;
use std::time::{Duration, Instant};

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Collects `iterations` snapshots one interval apart and prints each.
pub fn command_test(iterations: usize, format: ConfigFormat, config: &Config) -> anyhow::Result<()> {
    println!("🧪 hostmon - Test Mode");
    println!("======================");

    let mut collector = hostmon::system_collector(config.collector_settings(), config.gpu_command());
    let period = Duration::from_millis(config.interval_ms());

    for iteration in 1..=iterations {
        // CPU usage is measured since the previous refresh
        std::thread::sleep(period);

        println!("\n🔄 Iteration {}/{}:", iteration, iterations);
        let start = Instant::now();
        let snapshot = collector.collect()?;
        println!(
            "   ⏱️  Collect duration: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        println!("{}", render_snapshot(&snapshot, &format)?);
    }

    let histories = collector.histories();
    println!(
        "📈 History: {} of {} samples retained",
        histories.cpu.len(),
        histories.capacity()
    );
    println!("\n✅ Test completed successfully");
    Ok(())
}

fn render_snapshot(snapshot: &Snapshot, format: &ConfigFormat) -> anyhow::Result<String> {
    let text = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(snapshot)?,
        ConfigFormat::Yaml => serde_yaml::to_string(snapshot)?,
        // Value ordering puts plain keys before tables, which TOML requires.
        ConfigFormat::Toml => toml::Value::try_from(snapshot)?.to_string(),
    };
    Ok(text)
}
