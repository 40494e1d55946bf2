//! Managed store
//!
//! Holds the authoritative copy of every record under
//! `node_modules/.deconf/<name>`. Every write is a full overwrite; files are
//! written in place, so a crash mid-write can leave a partial file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::Record;

/// Directory of materialized records, keyed by record name
#[derive(Debug, Clone)]
pub struct ManagedStore {
    dir: PathBuf,
}

impl ManagedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the stored path for a record name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Writes every record, creating parent directories as needed.
    /// Returns the written paths in record order.
    pub fn materialize(&self, records: &[Record]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(records.len());

        for record in records {
            let path = self.path_for(&record.name);

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            let mut file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(&record.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            written.push(path);
        }

        Ok(written)
    }

    /// Reads back the stored content for a record name
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name);
        fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
