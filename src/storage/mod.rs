//! # Storage Layer
//!
//! Everything deconf reads or writes on disk.
//!
//! ## Locations
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Managed files | Raw bytes | `<project>/node_modules/.deconf/<name>` |
//! | Project links | Symlinks | `<project>/<name>` |
//! | Ignore list | Lines | `<project>/.gitignore` |
//! | Editor settings | JSON (comments allowed) | `<project>/.vscode/settings.json` |
//! | Registry | One path per line | `~/.config/deconf/files` |
//! | Config | TOML | `~/.config/deconf/config.toml` |
//! | Daemon log | Text | `~/.config/deconf/daemon.log` |
//!
//! ## Concurrency Safety
//!
//! - [`Registry::try_acquire`] takes an exclusive `fs2` lock so only one daemon
//!   runs per user
//! - Project files are assumed to have a single writer per document
//! - Managed files are overwritten in place, not atomically
//!
//! ## Key Types
//!
//! - [`Document`] - A source document and its format
//! - [`Project`] - Paths derived from the document's directory
//! - [`ManagedStore`] - Materialized record content
//! - [`Registry`] - Watched document paths and the single-instance lock

mod document;
mod project;
mod store;
mod links;
mod gitignore;
mod vscode;
mod registry;
mod config;
mod log;

pub use document::{Document, DocumentError, DOCUMENT_NAMES};
pub use project::{Project, ProjectError, DEPENDENCY_DIR, STORE_DIR};
pub use store::ManagedStore;
pub use links::{link_records, LinkReport, SkippedLink};
pub use gitignore::{merge_ignore, IgnoreOutcome, MergeError, MARKER};
pub use vscode::{exclude_map, merge_vscode, FILES_EXCLUDE};
pub use registry::{InstanceGuard, Registry, RegistryError, REGISTRY_FILE};
pub use config::{Config, ConfigError, Settings};
pub use log::LogFile;
