//! Command line for the `docgrab` binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docgrab_core::DocumentRef;
use docgrab_engine::{Credential, CredentialStore, JsonFileCredentialStore};
use engine_logging::{engine_info, LogDestination};

use crate::platform::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::platform::{bridge, session};

#[derive(Debug, Parser)]
#[command(name = "docgrab", version)]
#[command(about = "Sequential PDF downloader for document library listings", long_about = None)]
pub struct Cli {
    /// RON config file (default: ./docgrab.ron if present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the PDFs are written to.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Where log records go: terminal, file or both.
    #[arg(long, global = true, value_name = "DEST")]
    pub log: Option<LogDestination>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every document listed in a JSON file, one after the other.
    Batch {
        /// JSON array of `{ "pk": ..., "name": ... }` objects.
        items: PathBuf,
        /// Total shown in progress lines, when it differs from the list length.
        #[arg(long, value_name = "N")]
        total: Option<usize>,
    },

    /// Download one document.
    Single {
        /// Document identifier.
        id: String,
        /// Display name; the file is saved as `<name>.pdf`.
        name: String,
    },

    /// Cache a credential for later downloads.
    Token {
        /// Bearer token value.
        token: String,
    },

    /// Speak the JSON command/event protocol over stdin and stdout.
    Bridge,
}

pub fn run_from_args() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    engine_logging::initialize(&config.log_settings()?);
    engine_info!("docgrab {} starting", env!("CARGO_PKG_VERSION"));
    engine_info!("{}", config_origin(&config));

    match cli.command {
        CliCommand::Batch { items, total } => {
            let items = session::load_items(&items)?;
            session::run_batch(&config, items, total)?;
        }
        CliCommand::Single { id, name } => {
            session::run_single(&config, DocumentRef::new(id, name))?;
        }
        CliCommand::Token { token } => save_token(&config, token)?,
        CliCommand::Bridge => bridge::run(&config)?,
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(destination) = cli.log {
        config.log_destination = destination;
    }
    Ok(config)
}

fn config_origin(config: &AppConfig) -> String {
    match &config.loaded_from {
        Some(path) => format!("Loaded config from {path:?}"),
        None => format!("No {DEFAULT_CONFIG_FILE} found; using built-in defaults"),
    }
}

fn save_token(config: &AppConfig, token: String) -> Result<()> {
    let credential = Credential::new(token).context("credential must not be blank")?;
    JsonFileCredentialStore::new(config.credential_cache.clone())
        .store(&credential)
        .with_context(|| format!("failed to cache credential in {:?}", config.credential_cache))?;
    println!("Credential saved to {}", config.credential_cache.display());
    Ok(())
}
