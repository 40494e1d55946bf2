//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::pipeline::sync_document;
use super::{daemon, watch};
use crate::storage::{Config, Document, Registry, Settings};

#[derive(Parser)]
#[command(name = "deconf")]
#[command(author, version, about = "Keep project config files in a single markdown document")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Add generated file names to .gitignore [default: true]
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub gitignore: Option<bool>,

    /// Hide generated files in .vscode/settings.json [default: false]
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub vscode: Option<bool>,

    /// Directory holding the registry, config and daemon log
    #[arg(long, global = true, env = "DECONF_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a document once and register it for the daemon
    Init {
        /// Document to apply (defaults to config.md in the current directory)
        path: Option<PathBuf>,
    },

    /// Apply a document, then re-apply it on every change
    Watch {
        /// Document to watch (defaults to config.md in the current directory)
        path: Option<PathBuf>,
    },

    /// Watch every registered document; exits if a daemon is already running
    Daemon,

    /// List registered documents
    List,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("deconf starting");

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };
    output.verbose_ctx("config", &format!("Using config directory: {}", config_dir.display()));

    let settings = Settings::resolve(config_dir, cli.gitignore, cli.vscode)?;
    output.verbose_ctx(
        "config",
        &format!(
            "gitignore={}, vscode={}",
            settings.flags.gitignore, settings.flags.vscode
        ),
    );

    match cli.command {
        Commands::Init { path } => init(&settings, &output, path.as_deref())?,
        Commands::Watch { path } => watch::run(&settings, &output, path.as_deref())?,
        Commands::Daemon => daemon::run(&settings, &output)?,
        Commands::List => list(&settings, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Applies the document once and registers it
fn init(settings: &Settings, output: &Output, path: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let document = Document::locate(&cwd, path)?;
    output.verbose_ctx("init", &format!("Applying {}", document.display()));

    let report = sync_document(&document, settings)?;

    let registry = Registry::in_dir(&settings.config_dir);
    let registered = registry.register(&document)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "report": report,
            "registered": registered,
            "registry": registry.path().display().to_string(),
        }));
    } else {
        report.emit(output);
        if registered {
            output.success(&format!("Registered {} for the daemon", document.display()));
        } else {
            output.verbose_ctx("init", "Document already registered");
        }
    }

    Ok(())
}

/// Prints registered document paths
fn list(settings: &Settings, output: &Output) -> Result<()> {
    let registry = Registry::in_dir(&settings.config_dir);
    let entries = registry.entries()?;
    output.verbose_ctx("list", &format!("Read {} entries from {}", entries.len(), registry.path().display()));

    if output.is_json() {
        output.data(&entries);
    } else if entries.is_empty() {
        println!("No documents registered");
    } else {
        for entry in &entries {
            println!("{}", entry.display());
        }
    }

    Ok(())
}
