//! CLI arguments and subcommands for hostmon.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "hostmon",
    about = "Host telemetry monitor for CPU, memory, disk and GPU usage",
    long_about = "Host telemetry monitor for CPU, memory, disk and GPU usage.\n\n\
                  Samples host metrics on a fixed interval and prints them to the console, \
                  appends them to a CSV log, or serves them as Prometheus metrics together \
                  with rolling history for dashboards.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides `log_level` from the config file) [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Sampling interval in milliseconds
    #[arg(short = 'i', long)]
    pub interval_ms: Option<u64>,

    /// Number of samples kept per rolling history
    #[arg(long)]
    pub history_length: Option<usize>,

    /// Path whose filesystem is reported as disk usage
    #[arg(long)]
    pub disk_path: Option<PathBuf>,

    /// GPU query command (must accept nvidia-smi query arguments)
    #[arg(long)]
    pub gpu_command: Option<String>,

    /// Disable GPU sampling
    #[arg(long)]
    pub disable_gpu: bool,

    /// CPU sensor group prefixes (comma-separated, case-insensitive)
    #[arg(long)]
    pub sensor_prefixes: Option<String>,

    /// Append every sample to this CSV file
    #[arg(long)]
    pub csv_log: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print samples to the console until interrupted (default)
    Watch {
        /// Stop after N samples
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
    },

    /// Serve Prometheus metrics and rolling history over HTTP
    Serve {
        /// HTTP listen port
        #[arg(short = 'p', long)]
        port: Option<u16>,

        /// Bind to specific interface/IP
        #[arg(long)]
        bind: Option<IpAddr>,

        /// Disable /health endpoint
        #[arg(long)]
        disable_health: bool,
    },

    /// Check sensors, GPU tool, disks and configuration
    Check {
        /// Check temperature sensors
        #[arg(long)]
        sensors: bool,

        /// Check GPU query tool
        #[arg(long)]
        gpu: bool,

        /// Check mounted disks
        #[arg(long)]
        disks: bool,

        /// Check everything
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Collect a few snapshots and print them
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
