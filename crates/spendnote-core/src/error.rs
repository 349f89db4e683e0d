//! Error types for Spendnote

use thiserror::Error;

use crate::credentials::Provider;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<keyring::Error> for Error {
    fn from(err: keyring::Error) -> Self {
        // keyring errors never carry the secret itself
        match err {
            keyring::Error::NoStorageAccess(e) => {
                Error::CredentialStore(format!("access denied: {}", e))
            }
            keyring::Error::PlatformFailure(e) => {
                Error::CredentialStore(format!("platform failure: {}", e))
            }
            other => Error::CredentialStore(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a remote understanding attempt
///
/// Closed set: callers matching on it are forced to handle every kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No API key stored for the configured provider (raised before any I/O)
    #[error("No API key stored for provider '{0}'")]
    MissingCredential(Provider),

    /// Transport failure, timeout, or server-side 5xx
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Response body missing expected fields or carrying wrong types
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider answered 429
    #[error("Rate limited (retry after {retry_after:?} seconds)")]
    RateLimited {
        /// Seconds to wait, from the Retry-After header
        retry_after: Option<u64>,
    },

    #[error("Unknown remote error: {0}")]
    Unknown(String),
}

impl RemoteError {
    /// Whether the orchestrator may retry this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::NetworkFailure(_))
    }

    /// Short machine-friendly label for logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::MissingCredential(_) => "missing_credential",
            RemoteError::NetworkFailure(_) => "network_failure",
            RemoteError::InvalidResponse(_) => "invalid_response",
            RemoteError::RateLimited { .. } => "rate_limited",
            RemoteError::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL so query strings never reach logs
        let err = err.without_url();
        if err.is_timeout() || err.is_connect() || err.is_request() {
            RemoteError::NetworkFailure(err.to_string())
        } else if err.is_decode() || err.is_body() {
            RemoteError::InvalidResponse(err.to_string())
        } else {
            RemoteError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::InvalidResponse(format!("Invalid JSON: {}", err))
    }
}
