//! OS credential store backend
//!
//! Uses the `keyring` crate:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: kernel keyutils

use keyring::Entry;
use tracing::{debug, warn};

use super::{CredentialStore, Provider, Secret};
use crate::error::Result;

/// Service name prefix for spendnote credentials
const SERVICE_PREFIX: &str = "spendnote";

/// Account name under which API keys are stored
const API_KEY_ACCOUNT: &str = "api_key";

/// Credential store backed by the system keychain
#[derive(Debug, Clone, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    /// Full service name with prefix
    fn service_name(provider: Provider) -> String {
        format!("{}:{}", SERVICE_PREFIX, provider.as_str())
    }

    fn entry(provider: Provider) -> Result<Entry> {
        Ok(Entry::new(&Self::service_name(provider), API_KEY_ACCOUNT)?)
    }
}

impl CredentialStore for KeyringStore {
    fn store(&self, provider: Provider, secret: &Secret) -> Result<()> {
        debug!(provider = %provider, "Storing API key in keychain");
        Self::entry(provider)?
            .set_password(secret.expose())
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "Failed to store API key");
                e
            })?;
        Ok(())
    }

    fn get(&self, provider: Provider) -> Result<Option<Secret>> {
        match Self::entry(provider)?.get_password() {
            // An empty stored value means "no key"
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(Secret::new(value))),
            Err(keyring::Error::NoEntry) => {
                debug!(provider = %provider, "No API key in keychain");
                Ok(None)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to read API key");
                Err(e.into())
            }
        }
    }

    fn delete(&self, provider: Provider) -> Result<()> {
        match Self::entry(provider)?.delete_credential() {
            Ok(()) => {
                debug!(provider = %provider, "API key deleted from keychain");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(provider = %provider, "API key already absent");
                Ok(())
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to delete API key");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name() {
        assert_eq!(
            KeyringStore::service_name(Provider::DeepSeek),
            "spendnote:deepseek"
        );
        assert_eq!(KeyringStore::service_name(Provider::OpenAi), "spendnote:openai");
    }

    // Round trips against the real keychain need platform access and are left
    // to manual runs of `spendnote key set/status/delete`.
}
