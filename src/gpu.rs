//! GPU statistics from an external query tool.
//!
//! The tool is asked for `name,memory.used,memory.total,utilization.gpu,
//! temperature.gpu` in `csv,noheader,nounits` format, one line per GPU.
//! Running the tool and parsing its output are separate so the parser can be
//! fed canned output.

use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::snapshot::GpuSample;

/// Default query tool, looked up on PATH.
pub const DEFAULT_GPU_COMMAND: &str = "nvidia-smi";

/// Arguments requesting the fixed field list and output format.
pub const GPU_QUERY_ARGS: &[&str] = &[
    "--query-gpu=name,memory.used,memory.total,utilization.gpu,temperature.gpu",
    "--format=csv,noheader,nounits",
];

/// Why the query tool produced no output.
#[derive(Debug, Error)]
pub enum GpuQueryError {
    #[error("GPU query tool '{0}' not found on PATH")]
    NotFound(String),
    #[error("GPU query tool exited with {0}")]
    Failed(String),
    #[error("failed to run GPU query tool: {0}")]
    Io(#[from] io::Error),
}

/// Output of the query tool that does not match the expected format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpuParseError {
    #[error("line {line}: expected 5 fields, got {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: invalid {field} value '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Something that can produce raw query-tool output.
pub trait GpuStatsSource {
    /// Raw stdout of one successful query.
    fn query(&mut self) -> Result<String, GpuQueryError>;
}

/// Runs `nvidia-smi` (or a compatible command) synchronously.
///
/// There is no timeout: a hung tool blocks the caller.
#[derive(Debug, Clone)]
pub struct NvidiaSmi {
    command: String,
}

impl NvidiaSmi {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for NvidiaSmi {
    fn default() -> Self {
        Self::new(DEFAULT_GPU_COMMAND)
    }
}

impl GpuStatsSource for NvidiaSmi {
    fn query(&mut self) -> Result<String, GpuQueryError> {
        let output = Command::new(&self.command)
            .args(GPU_QUERY_ARGS)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => GpuQueryError::NotFound(self.command.clone()),
                _ => GpuQueryError::Io(e),
            })?;

        if !output.status.success() {
            debug!(
                "{} stderr: {}",
                self.command,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(GpuQueryError::Failed(output.status.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Source used when GPU sampling is disabled; always reports unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGpu;

impl GpuStatsSource for NoGpu {
    fn query(&mut self) -> Result<String, GpuQueryError> {
        Err(GpuQueryError::NotFound("disabled".to_string()))
    }
}

impl<T: GpuStatsSource + ?Sized> GpuStatsSource for Box<T> {
    fn query(&mut self) -> Result<String, GpuQueryError> {
        (**self).query()
    }
}

/// Parses query-tool output into one sample per non-blank line.
pub fn parse_gpu_csv(output: &str) -> Result<Vec<GpuSample>, GpuParseError> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_gpu_line(idx + 1, line))
        .collect()
}

fn parse_gpu_line(line_no: usize, line: &str) -> Result<GpuSample, GpuParseError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, used, total, util, temp] = fields.as_slice() else {
        return Err(GpuParseError::FieldCount {
            line: line_no,
            found: fields.len(),
        });
    };

    Ok(GpuSample {
        name: name.to_string(),
        memory_used_mb: parse_field(line_no, "memory.used", used)?,
        memory_total_mb: parse_field(line_no, "memory.total", total)?,
        utilization_percent: parse_field(line_no, "utilization.gpu", util)?,
        temperature_c: parse_field(line_no, "temperature.gpu", temp)?,
    })
}

fn parse_field<T: std::str::FromStr>(
    line: usize,
    field: &'static str,
    value: &str,
) -> Result<T, GpuParseError> {
    value.parse().map_err(|_| GpuParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_gpu() {
        let gpus = parse_gpu_csv("NVIDIA T4, 1024, 16384, 23, 61\n").unwrap();
        assert_eq!(
            gpus,
            vec![GpuSample {
                name: "NVIDIA T4".to_string(),
                memory_used_mb: 1024,
                memory_total_mb: 16384,
                utilization_percent: 23,
                temperature_c: 61,
            }]
        );
    }

    #[test]
    fn test_parse_multiple_gpus_preserves_order() {
        let output = "NVIDIA A100-SXM4-40GB, 39000, 40960, 98, 71\n\nNVIDIA A100-SXM4-40GB, 12, 40960, 0, 33\n";
        let gpus = parse_gpu_csv(output).unwrap();
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].utilization_percent, 98);
        assert_eq!(gpus[1].memory_used_mb, 12);
        assert_eq!(gpus[1].temperature_c, 33);
    }

    #[test]
    fn test_parse_empty_output() {
        assert_eq!(parse_gpu_csv("").unwrap(), vec![]);
        assert_eq!(parse_gpu_csv("\n  \n").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_non_numeric_field_fails() {
        let err = parse_gpu_csv("NVIDIA T4, [N/A], 16384, 23, 61\n").unwrap_err();
        assert_eq!(
            err,
            GpuParseError::InvalidNumber {
                line: 1,
                field: "memory.used",
                value: "[N/A]".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_wrong_field_count_fails() {
        let err = parse_gpu_csv("NVIDIA T4, 1024, 16384, 23, 61, 535.104.05\n").unwrap_err();
        assert_eq!(err, GpuParseError::FieldCount { line: 1, found: 6 });
    }

    #[test]
    fn test_missing_command_is_not_found() {
        let mut smi = NvidiaSmi::new("hostmon-no-such-gpu-tool");
        let err = smi.query().unwrap_err();
        assert!(matches!(err, GpuQueryError::NotFound(cmd) if cmd == "hostmon-no-such-gpu-tool"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_failed() {
        let mut smi = NvidiaSmi::new("false");
        assert!(matches!(smi.query(), Err(GpuQueryError::Failed(_))));
    }

    #[test]
    fn test_no_gpu_source_is_unavailable() {
        assert!(matches!(NoGpu.query(), Err(GpuQueryError::NotFound(_))));
    }
}
