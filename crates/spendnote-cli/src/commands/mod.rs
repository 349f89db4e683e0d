//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Effective configuration display
//! - `key` - API key management (set, validate, status, delete)
//! - `parse` - Expense parsing

pub mod config;
pub mod key;
pub mod parse;

// Re-export command functions for main.rs
pub use config::*;
pub use key::*;
pub use parse::*;

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use spendnote_core::{CredentialStore, KeyringStore, MemoryStore};

/// Credential store for this invocation
pub fn open_store(memory_keys: bool) -> Arc<dyn CredentialStore> {
    if memory_keys {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(KeyringStore::new())
    }
}

/// Use the given secret, or read one line from stdin
///
/// Reading from stdin keeps keys out of shell history.
pub fn secret_or_stdin(secret: Option<String>) -> Result<String> {
    if let Some(secret) = secret {
        return Ok(secret);
    }

    eprint!("API key: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read API key from stdin")?;

    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        bail!("No API key provided");
    }
    Ok(secret)
}
