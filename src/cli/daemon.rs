//! Background daemon
//!
//! Holds the single-instance lock on the registry and runs one
//! [`WatchCoordinator`] per registered document. Redundant invocations (for
//! example one per shell startup) find the lock taken and exit quietly.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Result};

use super::output::{Output, Reporter};
use super::watch::WatchCoordinator;
use crate::storage::{LogFile, Registry, Settings};

/// Reports to the daemon log, echoing to the terminal under `--verbose`
struct DaemonReporter<'a> {
    log: LogFile,
    output: &'a Output,
}

impl DaemonReporter<'_> {
    fn write(&self, message: &str) {
        // A log that can't be written must not stop the watchers
        if let Err(e) = self.log.append(message) {
            self.output
                .verbose_ctx("daemon", &format!("Failed to write log: {:#}", e));
        }
    }
}

impl Reporter for DaemonReporter<'_> {
    fn info(&self, message: &str) {
        self.write(message);
        self.output.verbose_ctx("daemon", message);
    }

    fn warn(&self, message: &str) {
        self.write(&format!("WARN {}", message));
        self.output.verbose_ctx("daemon", message);
    }

    fn debug(&self, message: &str) {
        self.output.verbose_ctx("daemon", message);
    }
}

/// `deconf daemon`
pub fn run(settings: &Settings, output: &Output) -> Result<()> {
    let registry = Registry::in_dir(&settings.config_dir);

    let Some(mut guard) = registry.try_acquire()? else {
        output.verbose_ctx("daemon", "Another daemon holds the registry lock, exiting");
        return Ok(());
    };

    let documents = guard.entries()?;
    let reporter = DaemonReporter {
        log: LogFile::in_dir(&settings.config_dir),
        output,
    };

    if documents.is_empty() {
        output.success(&format!(
            "No documents registered in {}",
            registry.path().display()
        ));
        return Ok(());
    }

    reporter.info(&format!(
        "Daemon starting (PID: {}), watching {} document(s)",
        std::process::id(),
        documents.len()
    ));

    let failures = supervise(&documents, settings, &reporter);

    // The lock is held until every coordinator has ended
    drop(guard);

    if failures.is_empty() {
        reporter.info("Daemon stopped");
        return Ok(());
    }

    let failed: Vec<_> = failures
        .iter()
        .map(|(path, _)| path.display().to_string())
        .collect();
    bail!(
        "{} of {} watcher(s) failed: {}",
        failures.len(),
        documents.len(),
        failed.join(", ")
    )
}

/// Runs one coordinator per document on its own thread and waits for all of
/// them. A failing coordinator ends only its own thread.
fn supervise(
    documents: &[PathBuf],
    settings: &Settings,
    reporter: &dyn Reporter,
) -> Vec<(PathBuf, anyhow::Error)> {
    thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .map(|document| {
                let handle = scope.spawn(move || watch_one(document, settings, reporter));
                (document, handle)
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|(document, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("Watcher thread panicked")));
                result.err().map(|e| (document.clone(), e))
            })
            .collect()
    })
}

fn watch_one(document: &Path, settings: &Settings, reporter: &dyn Reporter) -> Result<()> {
    let result = WatchCoordinator::new(document, settings, reporter).run();
    if let Err(e) = &result {
        reporter.warn(&format!("Stopped watching {}: {:#}", document.display(), e));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Reporter for Collect {
        fn info(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
        fn warn(&self, message: &str) {
            self.0.lock().unwrap().push(format!("warn: {}", message));
        }
        fn debug(&self, _message: &str) {}
    }

    #[test]
    fn failing_watchers_are_isolated() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(dir.path().join("cfg"), None, None).unwrap();
        let documents = vec![
            dir.path().join("missing-a").join("config.md"),
            dir.path().join("missing-b").join("config.md"),
        ];
        let collect = Collect::default();

        let failures = supervise(&documents, &settings, &collect);

        assert_eq!(failures.len(), 2);
        let failed: Vec<_> = failures.iter().map(|(p, _)| p.clone()).collect();
        assert!(failed.contains(&documents[0]));
        assert!(failed.contains(&documents[1]));

        let lines = collect.0.into_inner().unwrap();
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("warn: Stopped watching")).count(),
            2
        );
    }

    #[test]
    fn lock_contention_exits_successfully() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(dir.path().to_path_buf(), None, None).unwrap();
        let output = Output::new(OutputFormat::Text, false);

        let _held = Registry::in_dir(dir.path()).try_acquire().unwrap().unwrap();

        assert!(run(&settings, &output).is_ok());
        assert!(!dir.path().join("daemon.log").exists());
    }

    #[test]
    fn empty_registry_exits_successfully() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(dir.path().to_path_buf(), None, None).unwrap();
        let output = Output::new(OutputFormat::Text, false);

        assert!(run(&settings, &output).is_ok());
        assert!(dir.path().join("files").exists());
    }

    #[test]
    fn unwatchable_documents_fail_the_daemon() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(dir.path().to_path_buf(), None, None).unwrap();
        let output = Output::new(OutputFormat::Text, false);
        let document = dir.path().join("gone").join("config.md");
        fs::write(dir.path().join("files"), format!("{}\n", document.display())).unwrap();

        let err = run(&settings, &output).unwrap_err();

        assert!(err.to_string().contains("1 of 1 watcher(s) failed"));
        let log = fs::read_to_string(dir.path().join("daemon.log")).unwrap();
        assert!(log.contains("Stopped watching"));
    }
}
