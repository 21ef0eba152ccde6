//! Decoupled logging pipeline.
//!
//! ```text
//! log::info!() ...
//!     |
//! [LogCollector]  (log::Log impl, never blocks the caller)
//!     |  \
//!     |   stderr (immediate)
//!     | (crossbeam unbounded channel)
//!     v
//! [disk writer thread] -> <log_dir>/kpm_autoload_<ts>.log
//! ```
//!
//! The writer is a plain OS thread so logging works from any runtime,
//! including `spawn_blocking` workers.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

enum LogMessage {
    Line(String),
    /// Flush marker with a channel to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Unified logger that writes to stderr and a log file
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_path: PathBuf,
    level: LevelFilter,
    echo_stderr: bool,
}

impl LogCollector {
    /// Create a collector writing to a new timestamped file in `log_dir`.
    pub fn new(log_dir: &Path, level: LevelFilter) -> Result<Self, String> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("Failed to create logs directory: {}", e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("kpm_autoload_{}.log", timestamp));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| format!("Failed to open log file {}: {}", log_path.display(), e))?;

        let (tx, rx) = unbounded::<LogMessage>();
        std::thread::spawn(move || run_disk_writer(file, rx));

        Ok(LogCollector {
            tx,
            log_path,
            level,
            echo_stderr: true,
        })
    }

    /// Disable the stderr echo (file only).
    pub fn quiet(mut self) -> Self {
        self.echo_stderr = false;
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Queue a preformatted line for the disk writer.
    pub fn log_str(&self, message: impl Into<String>) {
        let _ = self.tx.send(LogMessage::Line(message.into()));
    }

    /// Block until every line queued so far has been written and flushed.
    pub fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "[{}] [{}] {}: {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
        if self.echo_stderr {
            eprintln!("{}", line);
        }
        self.log_str(line);
    }

    fn flush(&self) {
        let _ = self.wait_for_empty();
    }
}

fn run_disk_writer(mut file: File, rx: crossbeam_channel::Receiver<LogMessage>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            LogMessage::Line(line) => {
                let _ = file.write_all(line.as_bytes());
                let _ = file.write_all(b"\n");
            }
            LogMessage::Flush(done) => {
                let _ = file.flush();
                let _ = done.send(());
            }
        }
    }
    let _ = file.flush();
}

/// Install a collector as the global `log` backend.
pub fn init_logging(log_dir: &Path, level: LevelFilter) -> Result<LogCollector, String> {
    let collector = LogCollector::new(log_dir, level)?;
    log::set_boxed_logger(Box::new(collector.clone()))
        .map(|()| log::set_max_level(level))
        .map_err(|e| format!("Failed to set global logger: {}", e))?;
    Ok(collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_collector_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let collector = LogCollector::new(&log_dir, LevelFilter::Info).unwrap();
        assert!(log_dir.exists());
        assert!(collector.log_path().exists());
    }

    #[test]
    fn test_lines_reach_disk_after_flush() {
        let temp_dir = TempDir::new().unwrap();
        let collector = LogCollector::new(temp_dir.path(), LevelFilter::Debug)
            .unwrap()
            .quiet();

        for i in 0..100 {
            collector.log_str(format!("line {}", i));
        }
        collector.wait_for_empty().unwrap();

        let content = std::fs::read_to_string(collector.log_path()).unwrap();
        assert!(content.contains("line 0"));
        assert!(content.contains("line 99"));
        assert_eq!(content.lines().count(), 100);
    }

    #[test]
    fn test_level_filter() {
        let temp_dir = TempDir::new().unwrap();
        let collector = LogCollector::new(temp_dir.path(), LevelFilter::Warn).unwrap();

        let info = Metadata::builder().level(log::Level::Info).build();
        let error = Metadata::builder().level(log::Level::Error).build();
        assert!(!collector.enabled(&info));
        assert!(collector.enabled(&error));
    }
}
