// hostmon - version 0.1.0
// Host telemetry monitor with tracing logging
use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter};

mod cache;
mod cli;
mod commands;
mod config;
mod console;
mod csv_log;
mod handlers;
mod metrics;
mod state;

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_serve, command_test, command_watch};
use config::{locate_config, resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; stdout carries the console samples.
fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let level = config.log_level()?;
    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// -------------------------------------------------------------------
/// MAIN APPLICATION ENTRY POINT
/// -------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    // Early exit for show/check modes
    if args.check_config {
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        return show_config(&config, &args.config_format);
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&config)?;
    if !args.no_config {
        if let Some(path) = locate_config(args.config.as_deref()) {
            info!("Loaded configuration from: {}", path.display());
        }
    }

    match args.command {
        Some(Commands::Check {
            sensors,
            gpu,
            disks,
            all,
        }) => command_check(sensors, gpu, disks, all, &config),
        Some(Commands::Config {
            output,
            format,
            commented,
        }) => command_config(output, format, commented),
        Some(Commands::Test { iterations, format }) => {
            tokio::task::block_in_place(|| command_test(iterations, format, &config))
        }
        Some(Commands::Serve { .. }) => command_serve(config).await,
        Some(Commands::Watch { iterations }) => {
            info!("Monitoring every {}ms, press Ctrl+C to stop", config.interval_ms());
            command_watch(&config, iterations).await
        }
        None => {
            info!("Monitoring every {}ms, press Ctrl+C to stop", config.interval_ms());
            command_watch(&config, None).await
        }
    }
}
