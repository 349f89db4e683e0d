//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spendnote_core::Provider;

/// Spendnote - Turn expense notes into structured records
#[derive(Parser)]
#[command(name = "spendnote")]
#[command(about = "Natural-language expense parser", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to <config dir>/spendnote/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep API keys in memory instead of the OS credential store
    ///
    /// Keys stored with this flag are gone when the process exits.
    #[arg(long, global = true)]
    pub memory_keys: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse an expense note
    Parse {
        /// The note, e.g. "午饭花了35元" or "coffee $4.50"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Skip the remote service and use local rules only
        #[arg(long)]
        local: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage provider API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store an API key (read from stdin when omitted)
    Set {
        /// The API key
        secret: Option<String>,

        /// Provider (openai, deepseek, custom); defaults to the configured one
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Store the key even if it fails format validation
        #[arg(long)]
        force: bool,
    },

    /// Check an API key's format without storing it
    Validate {
        /// The API key (read from stdin when omitted)
        secret: Option<String>,

        /// Provider (openai, deepseek, custom); defaults to the configured one
        #[arg(short, long)]
        provider: Option<Provider>,
    },

    /// Show which providers have a stored key
    Status {
        /// Only show this provider
        #[arg(short, long)]
        provider: Option<Provider>,
    },

    /// Delete a stored API key
    Delete {
        /// Provider (openai, deepseek, custom); defaults to the configured one
        #[arg(short, long)]
        provider: Option<Provider>,
    },
}
