//! Spendnote CLI - Natural-language expense parser
//!
//! Usage:
//!   spendnote parse 午饭花了35元          Parse an expense note
//!   spendnote parse --local coffee $4     Parse with local rules only
//!   spendnote key set --provider deepseek Store an API key (from stdin)
//!   spendnote key status                  Show stored keys
//!   spendnote config                      Show effective configuration

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use spendnote_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let store = commands::open_store(cli.memory_keys);

    match cli.command {
        Commands::Parse { text, local, json } => {
            commands::cmd_parse(&config, store, &text.join(" "), local, json).await
        }
        Commands::Key { action } => {
            let default_provider = config.remote.provider;
            match action {
                KeyAction::Set {
                    secret,
                    provider,
                    force,
                } => {
                    let secret = commands::secret_or_stdin(secret)?;
                    commands::cmd_key_set(
                        store.as_ref(),
                        provider.unwrap_or(default_provider),
                        &secret,
                        force,
                    )
                }
                KeyAction::Validate { secret, provider } => {
                    let secret = commands::secret_or_stdin(secret)?;
                    commands::cmd_key_validate(provider.unwrap_or(default_provider), &secret)
                }
                KeyAction::Status { provider } => commands::cmd_key_status(store.as_ref(), provider),
                KeyAction::Delete { provider } => {
                    commands::cmd_key_delete(store.as_ref(), provider.unwrap_or(default_provider))
                }
            }
        }
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
    }
}
