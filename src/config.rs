//! Configuration loading, merging and validation.
//!
//! Precedence: CLI flag > config file > built-in default. Config files may be
//! YAML, JSON or TOML; the format is picked from the file extension.

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use hostmon::gpu::DEFAULT_GPU_COMMAND;
use hostmon::sensors::DEFAULT_SENSOR_PREFIXES;
use hostmon::{
    default_disk_path, CollectorSettings, SensorMatcher, Thresholds, HISTORY_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Args, Commands, ConfigFormat, LogLevel};

pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_CSV_LOG_PATH: &str = "monitor_log.csv";

/// Locations probed when no `-c` is given, in order.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/hostmon/hostmon.yaml",
    "/etc/hostmon/hostmon.yml",
    "/etc/hostmon/hostmon.json",
    "/etc/hostmon/hostmon.toml",
    "./hostmon.yaml",
    "./hostmon.yml",
    "./hostmon.json",
    "./hostmon.toml",
];

/// Effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Sampling
    pub interval_ms: Option<u64>,
    #[serde(alias = "history-length")]
    pub history_length: Option<usize>,
    #[serde(alias = "disk-path")]
    pub disk_path: Option<PathBuf>,

    // GPU
    #[serde(alias = "enable-gpu")]
    pub enable_gpu: Option<bool>,
    #[serde(alias = "gpu-command")]
    pub gpu_command: Option<String>,

    // CPU temperature heuristic
    #[serde(alias = "sensor-prefixes")]
    pub sensor_prefixes: Option<Vec<String>>,

    // Display bands
    pub usage_low_threshold: Option<f32>,
    pub usage_high_threshold: Option<f32>,

    // CSV log
    #[serde(alias = "enable-csv-log")]
    pub enable_csv_log: Option<bool>,
    #[serde(alias = "csv-log-path")]
    pub csv_log_path: Option<PathBuf>,

    // HTTP server
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub enable_health: Option<bool>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            history_length: Some(HISTORY_CAPACITY),
            disk_path: Some(default_disk_path()),
            enable_gpu: Some(true),
            gpu_command: Some(DEFAULT_GPU_COMMAND.to_string()),
            sensor_prefixes: Some(
                DEFAULT_SENSOR_PREFIXES
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
            ),
            usage_low_threshold: Some(hostmon::bands::DEFAULT_LOW_THRESHOLD),
            usage_high_threshold: Some(hostmon::bands::DEFAULT_HIGH_THRESHOLD),
            enable_csv_log: Some(false),
            csv_log_path: Some(PathBuf::from(DEFAULT_CSV_LOG_PATH)),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            enable_health: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        let sensor_matcher = match &self.sensor_prefixes {
            Some(prefixes) => SensorMatcher::new(prefixes),
            None => SensorMatcher::default(),
        };

        CollectorSettings {
            disk_path: self.disk_path.clone().unwrap_or_else(default_disk_path),
            history_capacity: self.history_length.unwrap_or(HISTORY_CAPACITY),
            sensor_matcher,
        }
    }

    /// GPU command to run, or `None` when GPU sampling is disabled.
    pub fn gpu_command(&self) -> Option<&str> {
        if !self.enable_gpu.unwrap_or(true) {
            return None;
        }
        Some(self.gpu_command.as_deref().unwrap_or(DEFAULT_GPU_COMMAND))
    }

    pub fn thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            low: self.usage_low_threshold.unwrap_or(defaults.low),
            high: self.usage_high_threshold.unwrap_or(defaults.high),
        }
    }

    pub fn log_level(&self) -> anyhow::Result<LogLevel> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::Info),
            Some(s) => <LogLevel as ValueEnum>::from_str(s, true)
                .map_err(|e| anyhow!("Invalid log_level '{}': {}", s, e)),
        }
    }

    /// CSV log path when logging is enabled.
    pub fn csv_log_path(&self) -> Option<PathBuf> {
        if !self.enable_csv_log.unwrap_or(false) {
            return None;
        }
        Some(
            self.csv_log_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_LOG_PATH)),
        )
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.interval_ms == Some(0) {
        bail!("interval_ms must be greater than 0");
    }
    if cfg.history_length == Some(0) {
        bail!("history_length must be greater than 0");
    }

    if let Some(prefixes) = &cfg.sensor_prefixes {
        if prefixes.iter().all(|p| p.trim().is_empty()) {
            bail!("sensor_prefixes must contain at least one non-empty prefix");
        }
    }

    if cfg.enable_gpu.unwrap_or(true)
        && cfg.gpu_command.as_deref().map_or(false, |c| c.trim().is_empty())
    {
        bail!("gpu_command must not be empty while enable_gpu is true");
    }

    let t = cfg.thresholds();
    if !(0.0..=100.0).contains(&t.low) || !(0.0..=100.0).contains(&t.high) {
        bail!("usage thresholds must be within 0..=100");
    }
    if t.low > t.high {
        bail!(
            "usage_low_threshold ({}) must not exceed usage_high_threshold ({})",
            t.low,
            t.high
        );
    }

    cfg.log_level()?;

    if let Some(bind) = cfg.bind.as_deref() {
        bind.parse::<std::net::IpAddr>()
            .with_context(|| format!("Invalid bind address '{}'", bind))?;
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = &args.log_level {
        if let Some(value) = level.to_possible_value() {
            config.log_level = Some(value.get_name().to_string());
        }
    }
    if args.interval_ms.is_some() {
        config.interval_ms = args.interval_ms;
    }
    if args.history_length.is_some() {
        config.history_length = args.history_length;
    }
    if let Some(path) = &args.disk_path {
        config.disk_path = Some(path.clone());
    }
    if let Some(cmd) = &args.gpu_command {
        config.gpu_command = Some(cmd.clone());
    }
    if args.disable_gpu {
        config.enable_gpu = Some(false);
    }

    // Parse comma-separated sensor prefixes
    if let Some(prefixes) = &args.sensor_prefixes {
        config.sensor_prefixes = Some(
            prefixes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
    }

    if let Some(path) = &args.csv_log {
        config.enable_csv_log = Some(true);
        config.csv_log_path = Some(path.clone());
    }

    // Server overrides only exist on the serve subcommand
    if let Some(Commands::Serve {
        port,
        bind,
        disable_health,
    }) = &args.command
    {
        if let Some(p) = port {
            config.port = Some(*p);
        }
        if let Some(ip) = bind {
            config.bind = Some(ip.to_string());
        }
        if *disable_health {
            config.enable_health = Some(false);
        }
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
///
/// Missing files yield the defaults; fields absent from a file keep their
/// default values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = locate_config(path) else {
        return Ok(Config::default());
    };

    if !path.exists() {
        bail!("Config file not found: {}", path.display());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    parse_config(&content, &path)
}

/// The file `load_config` reads: the explicit path, else the first default
/// location that exists.
pub fn locate_config(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => Some(p.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf),
    }
}

fn parse_config(content: &str, path: &Path) -> anyhow::Result<Config> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        _ => serde_yaml::from_str(content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };
    Ok(config)
}

/// Serializes a config in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

/// Adds comments to YAML configuration
pub fn add_config_comments(yaml: String) -> String {
    let comments = r#"# hostmon configuration
# =====================
#
# Sampling
# --------
# interval_ms: 1000            # Sampling interval for watch and serve
# history_length: 60           # Samples kept per rolling history
# disk_path: "/"               # Filesystem reported as disk usage
#
# GPU
# ---
# enable_gpu: true             # Query GPUs every cycle
# gpu_command: "nvidia-smi"    # Must accept --query-gpu/--format arguments
#
# CPU temperature
# ---------------
# sensor_prefixes: [core, cpu] # Sensor group name prefixes, first match wins
#
# Display bands
# -------------
# usage_low_threshold: 50      # <= low: normal
# usage_high_threshold: 80     # above low: hot
#
# CSV log
# -------
# enable_csv_log: false        # Append every sample to csv_log_path
# csv_log_path: "monitor_log.csv"
#
# HTTP server (serve)
# -------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# enable_health: true          # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = Config {
            interval_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let cfg = Config {
            usage_low_threshold: Some(90.0),
            usage_high_threshold: Some(80.0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_prefixes() {
        let cfg = Config {
            sensor_prefixes: Some(vec![" ".to_string()]),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_empty_gpu_command_allowed_when_disabled() {
        let cfg = Config {
            enable_gpu: Some(false),
            gpu_command: Some(String::new()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
        assert_eq!(cfg.gpu_command(), None);
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "interval_ms: 2500\nsensor_prefixes: [k10temp]").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.interval_ms(), 2500);
        assert_eq!(cfg.sensor_prefixes, Some(vec!["k10temp".to_string()]));
        assert_eq!(cfg.history_length, Some(HISTORY_CAPACITY));
        assert_eq!(cfg.gpu_command(), Some("nvidia-smi"));
    }

    #[test]
    fn test_load_toml_and_json() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "port = 9300\nenable_gpu = false").unwrap();
        let cfg = load_config(Some(toml_file.path())).unwrap();
        assert_eq!(cfg.port, Some(9300));
        assert_eq!(cfg.gpu_command(), None);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json_file, r#"{{"history_length": 120}}"#).unwrap();
        let cfg = load_config(Some(json_file.path())).unwrap();
        assert_eq!(cfg.collector_settings().history_capacity, 120);
    }

    #[test]
    fn test_locate_explicit_config() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert_eq!(
            locate_config(Some(file.path())),
            Some(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/hostmon.yaml"))).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "hostmon",
            "--no-config",
            "--interval-ms",
            "250",
            "--sensor-prefixes",
            "Tctl, cpu",
            "--csv-log",
            "/tmp/out.csv",
            "serve",
            "--port",
            "9999",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.interval_ms(), 250);
        assert_eq!(
            cfg.sensor_prefixes,
            Some(vec!["Tctl".to_string(), "cpu".to_string()])
        );
        assert_eq!(cfg.csv_log_path(), Some(PathBuf::from("/tmp/out.csv")));
        assert_eq!(cfg.port, Some(9999));
    }

    #[test]
    fn test_log_level_from_cli_and_file() {
        let args = Args::parse_from(["hostmon", "--no-config", "--log-level", "debug"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.log_level().unwrap(), LogLevel::Debug);

        let cfg = Config {
            log_level: Some("WARN".to_string()),
            ..Config::default()
        };
        assert_eq!(cfg.log_level().unwrap(), LogLevel::Warn);

        let cfg = Config {
            log_level: Some("loud".to_string()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_render_config_round_trips_yaml() {
        let yaml = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.port, Some(DEFAULT_PORT));
        assert!(add_config_comments(yaml).starts_with("# hostmon configuration"));
    }
}
