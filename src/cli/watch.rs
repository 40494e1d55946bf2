//! Document watching
//!
//! A [`WatchCoordinator`] owns one document. It waits for the document to be
//! written, runs the pipeline, and goes back to waiting. Writes that pile up
//! while the pipeline runs collapse into a single follow-up run once the
//! document has been quiet for the poll interval.
//!
//! Only writes count: the pipeline reading the document must not trigger
//! another run. Failures of the pipeline are reported and the watch
//! continues. Failures of the watcher itself end the coordinator.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};

use anyhow::{anyhow, bail, Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::output::{Output, Reporter};
use super::pipeline::sync_document;
use crate::storage::{Document, Registry, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Running,
}

/// Re-runs the pipeline for one document whenever it is written
pub struct WatchCoordinator<'a> {
    document: PathBuf,
    settings: &'a Settings,
    reporter: &'a dyn Reporter,
    state: WatchState,
}

impl<'a> WatchCoordinator<'a> {
    pub fn new(document: impl Into<PathBuf>, settings: &'a Settings, reporter: &'a dyn Reporter) -> Self {
        Self {
            document: document.into(),
            settings,
            reporter,
            state: WatchState::Idle,
        }
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Watches until the watcher fails. Only returns with an error.
    pub fn run(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let _watcher = self.watch(tx)?;

        self.reporter
            .info(&format!("Watching for changes on {}", self.document.display()));

        self.follow(&rx)
    }

    /// Starts a watcher delivering events for the document's directory to `tx`
    pub fn watch(&self, tx: Sender<notify::Result<Event>>) -> Result<RecommendedWatcher> {
        // Editors often save by replacing the file, so watch its directory
        let dir = self
            .document
            .parent()
            .ok_or_else(|| anyhow!("Document has no parent directory: {}", self.document.display()))?;

        let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(watcher)
    }

    /// Runs the pipeline after each write to the document until the event
    /// channel closes or reports an error
    pub fn follow(&mut self, rx: &Receiver<notify::Result<Event>>) -> Result<()> {
        loop {
            let event = rx
                .recv()
                .map_err(|_| anyhow!("Watcher for {} stopped", self.document.display()))?;
            let event = event
                .with_context(|| format!("Watch error on {}", self.document.display()))?;

            if !is_write(&event.kind) || !touches(event.paths.iter().map(PathBuf::as_path), &self.document) {
                continue;
            }

            self.settle(rx)?;
            self.cycle();
        }
    }

    /// Drops events until the directory has been quiet for the poll interval
    fn settle(&self, rx: &Receiver<notify::Result<Event>>) -> Result<()> {
        loop {
            match rx.recv_timeout(self.settings.poll_interval) {
                Ok(event) => {
                    event.with_context(|| format!("Watch error on {}", self.document.display()))?;
                }
                Err(RecvTimeoutError::Timeout) => return Ok(()),
                Err(RecvTimeoutError::Disconnected) => {
                    bail!("Watcher for {} stopped", self.document.display())
                }
            }
        }
    }

    /// Runs the pipeline once. Returns whether it succeeded.
    pub fn cycle(&mut self) -> bool {
        self.state = WatchState::Running;
        self.reporter
            .debug(&format!("{} changed", self.document.display()));

        let succeeded = match sync_document(&self.document, self.settings) {
            Ok(report) => {
                report.emit(self.reporter);
                true
            }
            Err(e) => {
                self.reporter
                    .warn(&format!("Failed to apply {}: {:#}", self.document.display(), e));
                false
            }
        };

        self.state = WatchState::Idle;
        succeeded
    }
}

/// True for events that change file content or put a file in place.
/// Reads, opens and metadata updates are not writes.
fn is_write(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// True if any event path is the document. Events only come from the
/// document's own directory, so the file name is enough.
fn touches<'p>(paths: impl IntoIterator<Item = &'p Path>, document: &Path) -> bool {
    paths
        .into_iter()
        .any(|p| p.file_name().is_some() && p.file_name() == document.file_name())
}

/// `deconf watch`: apply once, register, then follow changes in the foreground
pub fn run(settings: &Settings, output: &Output, path: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let document = Document::locate(&cwd, path)?;

    let report = sync_document(&document, settings)?;
    report.emit(output);

    let registry = Registry::in_dir(&settings.config_dir);
    if registry.register(&document)? {
        output.verbose_ctx("watch", &format!("Registered {} for the daemon", document.display()));
    }

    WatchCoordinator::new(document, settings, output).run()
}
