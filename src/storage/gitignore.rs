//! `.gitignore` merging
//!
//! Names already present verbatim as a line are left alone; the rest are
//! appended in a single write, each behind a marker comment.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::domain::Record;

/// Comment line written before every appended name
pub const MARKER: &str = "# Added by deconf";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings document {path}: {message}")]
    InvalidSettings { path: PathBuf, message: String },
}

/// Outcome of merging names into an ignore list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreOutcome {
    /// There is no ignore list; nothing was done
    Missing,

    /// Names appended, in record order (possibly none)
    Merged(Vec<String>),
}

impl IgnoreOutcome {
    /// Names appended by this merge
    pub fn added(&self) -> &[String] {
        match self {
            IgnoreOutcome::Missing => &[],
            IgnoreOutcome::Merged(added) => added,
        }
    }
}

/// Appends record names missing from the ignore list at `path`
pub fn merge_ignore(path: &Path, records: &[Record]) -> Result<IgnoreOutcome> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IgnoreOutcome::Missing),
        Err(source) => {
            return Err(MergeError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    };

    let listed: Vec<&str> = existing
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let added: Vec<String> = records
        .iter()
        .filter(|r| !listed.contains(&r.name.as_str()))
        .map(|r| r.name.clone())
        .collect();

    if added.is_empty() {
        return Ok(IgnoreOutcome::Merged(added));
    }

    let mut batch = String::new();
    for name in &added {
        batch.push('\n');
        batch.push_str(MARKER);
        batch.push('\n');
        batch.push_str(name);
    }

    let unwritable = |source| MergeError::Unwritable {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(unwritable)?;
    file.write_all(batch.as_bytes()).map_err(unwritable)?;

    Ok(IgnoreOutcome::Merged(added))
}
