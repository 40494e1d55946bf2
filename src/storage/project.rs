//! Project layout
//!
//! The project root is the directory holding the source document. deconf
//! only operates inside projects that already have a dependency directory.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use super::ManagedStore;

/// Dependency directory the managed store lives in
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Managed store directory name inside the dependency directory
pub const STORE_DIR: &str = ".deconf";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("No node_modules directory in {0}. deconf only runs inside a project with installed dependencies.")]
    DependencyDirectoryMissing(PathBuf),
}

/// A project that managed files are materialized into
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the dependency directory path
    pub fn dependency_dir(&self) -> PathBuf {
        self.root.join(DEPENDENCY_DIR)
    }

    /// Returns the managed store directory path
    pub fn store_dir(&self) -> PathBuf {
        self.dependency_dir().join(STORE_DIR)
    }

    /// Returns the project's `.gitignore` path
    pub fn gitignore_path(&self) -> PathBuf {
        self.root.join(".gitignore")
    }

    /// Returns the project's editor settings path
    pub fn vscode_settings_path(&self) -> PathBuf {
        self.root.join(".vscode").join("settings.json")
    }

    /// Opens the managed store, refusing to run outside a dependency-managed project
    pub fn store(&self) -> Result<ManagedStore> {
        let dependency_dir = self.dependency_dir();
        if !dependency_dir.is_dir() {
            return Err(ProjectError::DependencyDirectoryMissing(self.root.clone()).into());
        }
        Ok(ManagedStore::new(self.store_dir()))
    }

    /// Path where a record with the given name appears in the project tree
    pub fn link_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn layout_paths() {
        let project = Project::new("/work/app");

        assert_eq!(project.dependency_dir(), PathBuf::from("/work/app/node_modules"));
        assert_eq!(project.store_dir(), PathBuf::from("/work/app/node_modules/.deconf"));
        assert_eq!(project.gitignore_path(), PathBuf::from("/work/app/.gitignore"));
        assert_eq!(
            project.vscode_settings_path(),
            PathBuf::from("/work/app/.vscode/settings.json")
        );
        assert_eq!(project.link_path("a/b.txt"), PathBuf::from("/work/app/a/b.txt"));
    }

    #[test]
    fn store_requires_dependency_dir() {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path());

        let err = project.store().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProjectError>(),
            Some(ProjectError::DependencyDirectoryMissing(_))
        ));

        fs::create_dir_all(dir.path().join(DEPENDENCY_DIR)).unwrap();
        let store = project.store().unwrap();
        assert_eq!(store.dir(), project.store_dir());
    }
}
