//! Console monitoring loop.

use std::io::{self, Write};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::commands::{collect_blocking, shutdown_signal};
use crate::config::Config;
use crate::console::render_snapshot;
use crate::csv_log::CsvLogger;

/// Prints a snapshot every interval until interrupted or `iterations` is reached.
pub async fn command_watch(config: &Config, iterations: Option<usize>) -> anyhow::Result<()> {
    let thresholds = config.thresholds();
    let mut collector = hostmon::system_collector(config.collector_settings(), config.gpu_command());

    let mut csv = match config.csv_log_path() {
        Some(path) => {
            let logger = CsvLogger::open(&path)?;
            info!("Logging samples to {}", logger.path().display());
            Some(logger)
        }
        None => None,
    };

    let mut ticker = interval(Duration::from_millis(config.interval_ms()));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately; skip it so the first CPU reading
    // covers a full interval.
    ticker.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut printed = 0usize;
    loop {
        if iterations.is_some_and(|n| printed >= n) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                println!("\nMonitoring stopped.");
                return Ok(());
            }
        }

        let (returned, result) = collect_blocking(collector).await?;
        collector = returned;

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Collection failed, skipping cycle: {}", e);
                continue;
            }
        };

        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", render_snapshot(&snapshot, &thresholds))?;
            stdout.flush()?;
        }

        if let Some(logger) = csv.as_mut() {
            if let Err(e) = logger.log(&snapshot) {
                warn!("Failed to append to {}: {}", logger.path().display(), e);
            }
        }

        printed += 1;
        debug!("Printed sample {}", printed);
    }

    Ok(())
}
