//! Source documents
//!
//! A document is read fresh from disk on every pipeline run; nothing about
//! it is cached between runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::{Extraction, Flags, Format};

/// File names looked up in the working directory when no path is given
pub const DOCUMENT_NAMES: &[&str] = &["config.md"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("No config file was found in {dir}. Please create any of {names:?}")]
    NoneFound {
        dir: PathBuf,
        names: &'static [&'static str],
    },
}

/// A source document with its detected format
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    content: Vec<u8>,
    format: Format,
}

impl Document {
    /// Resolves the document path: an explicit path (relative to `cwd`), or
    /// the first known document name present in `cwd`. The result is
    /// canonical, so one document always registers as one path.
    pub fn locate(cwd: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
        let path = match explicit {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(DocumentError::NotFound(path).into());
                }
                path
            }
            None => DOCUMENT_NAMES
                .iter()
                .map(|name| cwd.join(name))
                .find(|path| path.is_file())
                .ok_or_else(|| DocumentError::NoneFound {
                    dir: cwd.to_path_buf(),
                    names: DOCUMENT_NAMES,
                })?,
        };

        fs::canonicalize(&path)
            .with_context(|| format!("Failed to resolve document path: {}", path.display()))
    }

    /// Reads a document and detects its format from the extension
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = Format::from_path(&path)?;

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DocumentError::NotFound(path).into())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read document: {}", path.display()))
            }
        };

        Ok(Self {
            path,
            content,
            format,
        })
    }

    /// Extracts records with the format's extractor
    pub fn extract(&self, defaults: Flags) -> Result<Extraction> {
        let extractor = self.format.extractor()?;
        let extraction = extractor
            .extract(&self.content, defaults)
            .with_context(|| format!("Failed to extract {}", self.path.display()))?;
        Ok(extraction)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Directory holding the document; managed files are linked relative to it
    pub fn project_root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }
}
