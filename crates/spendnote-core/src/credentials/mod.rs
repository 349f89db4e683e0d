//! API key storage for remote understanding providers
//!
//! Keys are opaque secrets addressed by a closed [`Provider`] enum rather than
//! free-form strings. Two stores ship with the crate:
//!
//! - [`KeyringStore`]: the OS credential store (macOS Keychain, Windows
//!   Credential Manager, Linux kernel keyring)
//! - [`MemoryStore`]: process-local map for tests and throwaway sessions
//!
//! [`validate`] checks key format offline before a key is stored or used.
//! Nothing in this module logs or formats a raw key.

mod keychain;
mod memory;
mod validation;

pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;
pub use self::validation::validate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Remote understanding providers with a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// api.openai.com
    OpenAi,
    /// api.deepseek.com
    DeepSeek,
    /// Self-hosted OpenAI-compatible server (vLLM, LocalAI, llama-server, ...)
    Custom,
}

impl Provider {
    /// Stable key used for credential lookup and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Custom => "custom",
        }
    }

    /// Get all providers
    pub fn all() -> &'static [Provider] {
        &[Self::OpenAi, Self::DeepSeek, Self::Custom]
    }

    /// Default API base URL (None for self-hosted servers)
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com"),
            Self::DeepSeek => Some("https://api.deepseek.com"),
            Self::Custom => None,
        }
    }

    /// Default chat model
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Custom => "llama3.2",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            "custom" | "openai_compatible" | "self_hosted" => Ok(Self::Custom),
            other => Err(format!(
                "Unknown provider '{}' (expected one of: openai, deepseek, custom)",
                other
            )),
        }
    }
}

/// A secret that refuses to print itself
///
/// `Debug` and `Display` are redacted; use [`Secret::expose`] at the single
/// point where the raw value is needed (the Authorization header).
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Storage for provider API keys
///
/// Implementations must be safe to share across tasks: a parse may read a key
/// while a settings surface rotates or deletes it.
pub trait CredentialStore: Send + Sync {
    /// Store a key, overwriting any existing one
    fn store(&self, provider: Provider, secret: &Secret) -> Result<()>;

    /// Current key for a provider, `None` if absent
    fn get(&self, provider: Provider) -> Result<Option<Secret>>;

    /// Remove a key; deleting an absent key succeeds
    fn delete(&self, provider: Provider) -> Result<()>;

    /// Whether a key is present (storage errors read as absent)
    fn contains(&self, provider: Provider) -> bool {
        matches!(self.get(provider), Ok(Some(_)))
    }
}
