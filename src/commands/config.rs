//! `config` subcommand: writes a default configuration file.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{add_config_comments, render_config, Config};

/// Generates configuration files
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(&format)));
    let content = generate_config(&format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Default configuration text; comments are only added to YAML output.
pub fn generate_config(format: &ConfigFormat, commented: bool) -> anyhow::Result<String> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml if commented => add_config_comments(content),
        _ => content,
    })
}

fn default_file_name(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "hostmon.yaml",
        ConfigFormat::Json => "hostmon.json",
        ConfigFormat::Toml => "hostmon.toml",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_configs_parse_back() {
        let yaml = generate_config(&ConfigFormat::Yaml, true).unwrap();
        let cfg: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg.interval_ms(), 1000);

        let json = generate_config(&ConfigFormat::Json, true).unwrap();
        assert!(!json.contains('#'));
        let cfg: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.history_length, Some(60));

        let toml_text = generate_config(&ConfigFormat::Toml, false).unwrap();
        let cfg: Config = toml::from_str(&toml_text).unwrap();
        assert_eq!(cfg.gpu_command(), Some("nvidia-smi"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, false).unwrap();
        let cfg: Config = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(cfg.port, Some(9216));
    }
}
