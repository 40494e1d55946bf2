//! The extraction-and-materialization pipeline
//!
//! Document → records → managed store → project links, then the optional
//! `.gitignore` and editor settings merges. The first failing step aborts the
//! run; files already written stay written.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use super::output::Reporter;
use crate::domain::Flags;
use crate::storage::{
    link_records, merge_ignore, merge_vscode, Document, IgnoreOutcome, LinkReport, Project,
    Settings,
};

/// What a pipeline run did
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub document: PathBuf,
    pub store: PathBuf,

    /// Record names in document order
    pub written: Vec<String>,

    pub links: LinkReport,

    /// Effective flags after document metadata
    pub flags: Flags,

    /// Names appended to `.gitignore`; `None` when the merge did not run or
    /// there was no `.gitignore`
    pub gitignore_added: Option<Vec<String>>,

    /// The merge was requested but the project has no `.gitignore`
    pub gitignore_missing: bool,

    pub vscode_updated: bool,
}

/// Runs the full pipeline for one document
pub fn sync_document(path: &Path, settings: &Settings) -> Result<SyncReport> {
    let document = Document::read(path)?;
    let extraction = document.extract(settings.flags)?;
    let records = &extraction.records;

    let project = Project::new(document.project_root());
    let store = project.store()?;
    store.materialize(records)?;

    let links = link_records(&project, &store, records)?;

    let mut report = SyncReport {
        document: document.path().to_path_buf(),
        store: store.dir().to_path_buf(),
        written: records.iter().map(|r| r.name.clone()).collect(),
        links,
        flags: extraction.flags,
        gitignore_added: None,
        gitignore_missing: false,
        vscode_updated: false,
    };

    if extraction.flags.gitignore {
        match merge_ignore(&project.gitignore_path(), records)? {
            IgnoreOutcome::Missing => report.gitignore_missing = true,
            IgnoreOutcome::Merged(added) => report.gitignore_added = Some(added),
        }
    }

    if extraction.flags.vscode {
        merge_vscode(&project.vscode_settings_path(), records)?;
        report.vscode_updated = true;
    }

    Ok(report)
}

impl SyncReport {
    /// Reports the run, one line per step that did something
    pub fn emit(&self, reporter: &dyn Reporter) {
        reporter.info(&format!(
            "Wrote {} config file(s) to {}",
            self.written.len(),
            self.store.display()
        ));

        for name in &self.links.created {
            reporter.debug(&format!("Linked {}", name));
        }
        for skipped in &self.links.skipped {
            reporter.warn(&format!("Skipped link {}: {}", skipped.name, skipped.reason));
        }

        if self.gitignore_missing {
            reporter.info("There's no .gitignore to add configuration files.");
        }
        if let Some(added) = self.gitignore_added.as_ref().filter(|a| !a.is_empty()) {
            reporter.info(&format!("Applied changes to .gitignore: {}", added.join(", ")));
        }

        if self.vscode_updated {
            reporter.info("Changes applied to .vscode/settings.json");
        }
    }
}
