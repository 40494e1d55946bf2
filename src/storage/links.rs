//! Project-tree symlinks into the managed store
//!
//! Linking is best-effort per record: an existing file or foreign link at the
//! destination is reported and skipped, never fatal. Only failing to create
//! the destination's parent directory aborts the batch.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{ManagedStore, Project};
use crate::domain::Record;

/// A link that could not be created
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLink {
    pub name: String,
    pub reason: String,
}

/// Outcome of linking a batch of records
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    /// Links created in this run
    pub created: Vec<String>,

    /// Links that already pointed at the store
    pub unchanged: Vec<String>,

    /// Destinations left untouched because something else is there
    pub skipped: Vec<SkippedLink>,
}

/// Links every record's project path to its managed store entry
pub fn link_records(project: &Project, store: &ManagedStore, records: &[Record]) -> Result<LinkReport> {
    let mut report = LinkReport::default();

    for record in records {
        let target = store.path_for(&record.name);
        let link = project.link_path(&record.name);

        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        if fs::read_link(&link).is_ok_and(|existing| existing == target) {
            report.unchanged.push(record.name.clone());
            continue;
        }

        match symlink(&target, &link) {
            Ok(()) => report.created.push(record.name.clone()),
            Err(e) => report.skipped.push(SkippedLink {
                name: record.name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(report)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
