//! Extracted file records and the behavior flags that travel with them

use serde::Serialize;

/// A named file extracted from a source document
///
/// `name` is a project-relative path. Content is always present: a heading
/// that never receives a code block is rejected during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Record {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Which collaborator documents a pipeline run should touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Flags {
    /// Append managed names to `.gitignore`
    pub gitignore: bool,

    /// Hide managed names in `.vscode/settings.json`
    pub vscode: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            gitignore: true,
            vscode: false,
        }
    }
}

impl Flags {
    /// Returns these flags with any provided override applied
    pub fn overlay(self, gitignore: Option<bool>, vscode: Option<bool>) -> Self {
        Self {
            gitignore: gitignore.unwrap_or(self.gitignore),
            vscode: vscode.unwrap_or(self.vscode),
        }
    }
}

/// Result of extracting a document: records in heading order plus the
/// effective flags after document metadata was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub flags: Flags,
}

impl Extraction {
    /// Record names in extraction order
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}
