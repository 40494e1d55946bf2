//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init [path]` | Apply a document once and register it |
//! | `watch [path]` | Apply a document, then follow its changes in the foreground |
//! | `daemon` | Watch every registered document; a second daemon exits at once |
//! | `list` | Show registered documents |
//!
//! ## Flags
//!
//! - `--gitignore[=bool]` / `--vscode[=bool]` override the config file;
//!   document front matter overrides both
//! - `--config-dir` (or `DECONF_CONFIG_DIR`) relocates the registry, config
//!   and daemon log
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Use `--verbose` (or `-v`) for debug output on stderr.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod pipeline;
mod watch;
mod daemon;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat, Reporter};
pub use pipeline::{sync_document, SyncReport};
pub use watch::{WatchCoordinator, WatchState};
