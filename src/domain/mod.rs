//! Domain models for deconf
//!
//! Contains the extraction logic without any I/O concerns.

mod record;
mod format;
mod markdown;

pub use record::{Extraction, Flags, Record};
pub use format::{ExtractError, Extractor, Format, FormatError};
pub use markdown::MarkdownExtractor;
