//! Daemon registry
//!
//! A per-user file listing the documents the daemon watches, one absolute
//! path per line. An exclusive advisory lock on the same file keeps a single
//! daemon per user: the lock holder is the only process iterating it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use thiserror::Error;

/// Registry file name inside the per-user config directory
pub const REGISTRY_FILE: &str = "files";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Document path must be absolute: {0}")]
    RelativePath(PathBuf),

    #[error("Failed to lock registry {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The persisted set of watched document paths
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the registry stored in the given config directory
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(REGISTRY_FILE))
    }

    /// Returns the path to the registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the registry file, creating it and its directory if needed
    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open registry: {}", self.path.display()))
    }

    /// Adds a document path unless already present. Returns true if added.
    pub fn register(&self, document: &Path) -> Result<bool> {
        if !document.is_absolute() {
            return Err(RegistryError::RelativePath(document.to_path_buf()).into());
        }

        let mut file = self.open()?;
        let content = read_from_start(&mut file, &self.path)?;

        if parse_entries(&content).iter().any(|p| p == document) {
            return Ok(false);
        }

        let mut line = String::new();
        if !content.is_empty() && !content.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&document.to_string_lossy());
        line.push('\n');

        file.seek(SeekFrom::End(0))
            .and_then(|_| file.write_all(line.as_bytes()))
            .with_context(|| format!("Failed to write registry: {}", self.path.display()))?;

        Ok(true)
    }

    /// Reads all registered paths without taking the lock
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_entries(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read registry: {}", self.path.display())),
        }
    }

    /// Takes the single-instance lock without blocking.
    /// Returns `None` when another process already holds it.
    pub fn try_acquire(&self) -> Result<Option<InstanceGuard>> {
        let file = self.open()?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(InstanceGuard {
                file,
                path: self.path.clone(),
            })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(source) => Err(RegistryError::Lock {
                path: self.path.clone(),
                source,
            }
            .into()),
        }
    }
}

/// Exclusive hold on the registry, released when dropped
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    /// Reads all registered paths through the locked handle
    pub fn entries(&mut self) -> Result<Vec<PathBuf>> {
        let content = read_from_start(&mut self.file, &self.path)?;
        Ok(parse_entries(&content))
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_from_start(file: &mut File, path: &Path) -> Result<String> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_string(&mut content))
        .with_context(|| format!("Failed to read registry: {}", path.display()))?;
    Ok(content)
}

/// Non-empty lines, deduplicated, first occurrence wins
fn parse_entries(content: &str) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let path = PathBuf::from(line);
        if !entries.contains(&path) {
            entries.push(path);
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn register_appends_once() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(&dir.path().join("deconf"));
        let doc = dir.path().join("project").join("config.md");

        assert!(registry.register(&doc).unwrap());
        assert!(!registry.register(&doc).unwrap());

        assert_eq!(
            fs::read_to_string(registry.path()).unwrap(),
            format!("{}\n", doc.display())
        );
        assert_eq!(registry.entries().unwrap(), vec![doc]);
    }

    #[test]
    fn register_rejects_relative_paths() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(dir.path());

        let err = registry.register(Path::new("config.md")).unwrap_err();
        assert!(err.downcast_ref::<RegistryError>().is_some());
    }

    #[test]
    fn register_repairs_missing_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(dir.path());
        fs::write(registry.path(), "/a/config.md").unwrap();

        registry.register(Path::new("/b/config.md")).unwrap();

        assert_eq!(
            fs::read_to_string(registry.path()).unwrap(),
            "/a/config.md\n/b/config.md\n"
        );
    }

    #[test]
    fn entries_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(dir.path());
        fs::write(registry.path(), "/a.md\n\n/b.md\n/a.md\n").unwrap();

        assert_eq!(
            registry.entries().unwrap(),
            vec![PathBuf::from("/a.md"), PathBuf::from("/b.md")]
        );
    }

    #[test]
    fn missing_registry_has_no_entries() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(&dir.path().join("absent"));

        assert!(registry.entries().unwrap().is_empty());
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::in_dir(dir.path());
        registry.register(Path::new("/x/config.md")).unwrap();

        let mut guard = registry.try_acquire().unwrap().expect("first acquire");
        assert!(registry.try_acquire().unwrap().is_none());
        assert_eq!(guard.entries().unwrap(), vec![PathBuf::from("/x/config.md")]);

        drop(guard);
        assert!(registry.try_acquire().unwrap().is_some());
    }
}
