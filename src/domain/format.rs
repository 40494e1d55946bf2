//! Source document formats
//!
//! Only markdown is realized. YAML and JSON are recognized by extension so
//! that users get a precise error instead of "unknown file".

use std::fmt;
use std::path::Path;

use thiserror::Error;

use super::markdown::MarkdownExtractor;
use super::record::{Extraction, Flags};

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Unsupported format: {0} documents are not implemented yet")]
    NotImplemented(Format),

    #[error("Unsupported format: unrecognized extension '{0}'")]
    Unrecognized(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

/// Turns raw document bytes into records
pub trait Extractor {
    /// Extracts records, starting from `defaults` for the behavior flags
    fn extract(&self, content: &[u8], defaults: Flags) -> Result<Extraction, ExtractError>;
}

/// Known source document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Yaml,
    Json,
}

impl Format {
    /// Detects the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext {
            "md" => Ok(Format::Markdown),
            "yml" | "yaml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(FormatError::Unrecognized(other.to_string())),
        }
    }

    /// Returns the extractor for this format
    pub fn extractor(&self) -> Result<&'static dyn Extractor, FormatError> {
        match self {
            Format::Markdown => Ok(&MarkdownExtractor),
            Format::Yaml | Format::Json => Err(FormatError::NotImplemented(*self)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_formats() {
        assert_eq!(Format::from_path(Path::new("config.md")), Ok(Format::Markdown));
        assert_eq!(Format::from_path(Path::new("a/b.yml")), Ok(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("b.yaml")), Ok(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("c.json")), Ok(Format::Json));
    }

    #[test]
    fn unrecognized_extension() {
        assert_eq!(
            Format::from_path(Path::new("config.txt")),
            Err(FormatError::Unrecognized("txt".to_string()))
        );
        assert_eq!(
            Format::from_path(Path::new("Makefile")),
            Err(FormatError::Unrecognized(String::new()))
        );
    }

    #[test]
    fn only_markdown_has_an_extractor() {
        assert!(Format::Markdown.extractor().is_ok());
        assert_eq!(
            Format::Yaml.extractor().err(),
            Some(FormatError::NotImplemented(Format::Yaml))
        );
        assert_eq!(
            Format::Json.extractor().err(),
            Some(FormatError::NotImplemented(Format::Json))
        );
    }
}
