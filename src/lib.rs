//! deconf - Project config files kept in one markdown document
//!
//! Each `` ## `name` `` heading followed by a fenced code block becomes a file.
//! Files are written to `node_modules/.deconf`, symlinked into the project,
//! and optionally hidden through `.gitignore` and `.vscode/settings.json`.
//! Documents can be watched in the foreground or by a per-user daemon.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Extraction, Flags, Format, Record};
