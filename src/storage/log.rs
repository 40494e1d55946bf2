//! Daemon log file
//!
//! Timestamped lines appended to `daemon.log` in the config directory,
//! rotated once the file grows past [`MAX_LOG_SIZE`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Maximum log file size before rotation (1MB)
pub const MAX_LOG_SIZE: u64 = 1024 * 1024;

/// Number of log files to keep
pub const LOG_ROTATION_COUNT: usize = 7;

/// Log file name inside the config directory
pub const LOG_FILE: &str = "daemon.log";

/// Append-only log shared by every watcher thread of the daemon
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates the log stored in the given config directory
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(LOG_FILE))
    }

    /// Returns the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line
    pub fn append(&self, message: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        rotate_logs_if_needed(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open log file")?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;

        Ok(())
    }
}

/// Rotates log files if the current log exceeds MAX_LOG_SIZE
fn rotate_logs_if_needed(log_path: &Path) -> Result<()> {
    let size = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return Ok(()),
    };
    if size < MAX_LOG_SIZE {
        return Ok(());
    }

    // Shift numbered logs up by one, dropping the oldest
    for i in (1..LOG_ROTATION_COUNT).rev() {
        let old_path = log_path.with_extension(format!("log.{}", i));
        let new_path = log_path.with_extension(format!("log.{}", i + 1));
        if old_path.exists() {
            if i + 1 >= LOG_ROTATION_COUNT {
                fs::remove_file(&old_path)?;
            } else {
                fs::rename(&old_path, &new_path)?;
            }
        }
    }

    fs::rename(log_path, log_path.with_extension("log.1"))?;

    Ok(())
}
