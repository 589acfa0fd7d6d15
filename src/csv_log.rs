//! Append-only CSV log of collected snapshots.
//!
//! The header is written only when the file is created; an existing file is
//! appended to as-is, without checking its header.

use hostmon::Snapshot;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CSV_HEADER: &str = "timestamp,cpu,memory,disk,net_sent,net_recv,gpu_load,gpu_temp";

pub struct CsvLogger {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvLogger {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let new_file = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        if new_file {
            writeln!(writer, "{CSV_HEADER}")?;
            writer.flush()?;
            debug!("Created CSV log {}", path.display());
        }

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it to disk.
    pub fn log(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        writeln!(self.writer, "{}", format_row(snapshot))?;
        self.writer.flush()
    }
}

/// One CSV row; absent values become empty fields.
pub fn format_row(snapshot: &Snapshot) -> String {
    let gpu = snapshot.primary_gpu();
    let fields = [
        snapshot.timestamp.to_rfc3339(),
        format!("{:.1}", snapshot.cpu_percent),
        format!("{:.1}", snapshot.memory_percent),
        snapshot
            .disk_percent
            .map(|d| format!("{:.1}", d))
            .unwrap_or_default(),
        opt(snapshot.network.map(|n| n.bytes_sent)),
        opt(snapshot.network.map(|n| n.bytes_recv)),
        opt(gpu.map(|g| g.utilization_percent)),
        opt(gpu.map(|g| g.temperature_c)),
    ];
    fields.join(",")
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
