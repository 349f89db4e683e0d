//! API key command implementations (set, validate, status, delete)
//!
//! Keys are never printed; only their presence and validation verdicts are.

use anyhow::{bail, Context, Result};
use spendnote_core::{validate, CredentialStore, Provider, Secret};
use tracing::{info, warn};

pub fn cmd_key_set(
    store: &dyn CredentialStore,
    provider: Provider,
    secret: &str,
    force: bool,
) -> Result<()> {
    let verdict = validate(secret, provider);
    if !verdict.is_valid {
        let reason = verdict.reason.unwrap_or_default();
        if !force {
            bail!(
                "Refusing to store invalid {} key: {} (use --force to store anyway)",
                provider,
                reason
            );
        }
        warn!(provider = %provider, reason = %reason, "Storing key that failed validation");
    }

    store
        .store(provider, &Secret::new(secret))
        .with_context(|| format!("Failed to store API key for {}", provider))?;

    info!(provider = %provider, "API key stored");
    println!("✓ Stored API key for {}", provider);
    Ok(())
}

pub fn cmd_key_validate(provider: Provider, secret: &str) -> Result<()> {
    let verdict = validate(secret, provider);
    if verdict.is_valid {
        println!("✓ Looks like a valid {} key", provider);
        Ok(())
    } else {
        bail!(
            "Invalid {} key: {}",
            provider,
            verdict.reason.unwrap_or_default()
        )
    }
}

pub fn cmd_key_status(store: &dyn CredentialStore, provider: Option<Provider>) -> Result<()> {
    println!();
    println!("🔑 API Keys");
    println!("   ─────────────────────────────────────────");
    for line in key_status_lines(store, provider) {
        println!("   {}", line);
    }
    println!();
    Ok(())
}

/// One status line per provider
pub fn key_status_lines(store: &dyn CredentialStore, provider: Option<Provider>) -> Vec<String> {
    let providers: Vec<Provider> = match provider {
        Some(p) => vec![p],
        None => Provider::all().to_vec(),
    };

    providers
        .into_iter()
        .map(|p| match store.get(p) {
            Ok(Some(_)) => format!("{:<10} stored", p.as_str()),
            Ok(None) => format!("{:<10} not stored", p.as_str()),
            Err(e) => format!("{:<10} unavailable ({})", p.as_str(), e),
        })
        .collect()
}

pub fn cmd_key_delete(store: &dyn CredentialStore, provider: Provider) -> Result<()> {
    store
        .delete(provider)
        .with_context(|| format!("Failed to delete API key for {}", provider))?;

    info!(provider = %provider, "API key deleted");
    println!("✓ Deleted API key for {}", provider);
    Ok(())
}
