//! Remote language-understanding backends
//!
//! # Architecture
//!
//! - `UnderstandingBackend` trait: one async operation turning text into a
//!   `ParseResult` tagged `Remote`, or a typed `RemoteError`
//! - `NluClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `RemoteClient` (HTTP), `MockBackend`
//!
//! Backends never fall back on their own and never retry; both are the
//! orchestrator's job (see `ExpenseParser`).

mod mock;
mod parsing;
mod remote;

pub use mock::MockBackend;
pub use remote::RemoteClient;

use async_trait::async_trait;

use crate::credentials::Provider;
use crate::error::RemoteError;
use crate::models::ParseResult;

/// Interface for remote understanding backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait UnderstandingBackend: Send + Sync {
    /// Parse `text` into a structured record
    ///
    /// Fails with `MissingCredential` before any I/O when no key is stored.
    async fn understand(&self, text: &str) -> Result<ParseResult, RemoteError>;

    /// Provider whose credential this backend uses
    fn provider(&self) -> Provider;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete understanding client
#[derive(Clone)]
pub enum NluClient {
    /// OpenAI-compatible HTTP endpoint
    Remote(RemoteClient),
    /// Scripted backend for testing
    Mock(MockBackend),
}

impl NluClient {
    /// Create a mock backend for testing
    pub fn mock() -> Self {
        NluClient::Mock(MockBackend::new())
    }

    /// Backend name for status output
    pub fn kind(&self) -> &'static str {
        match self {
            NluClient::Remote(_) => "openai_compatible",
            NluClient::Mock(_) => "mock",
        }
    }
}

impl From<RemoteClient> for NluClient {
    fn from(client: RemoteClient) -> Self {
        NluClient::Remote(client)
    }
}

impl From<MockBackend> for NluClient {
    fn from(backend: MockBackend) -> Self {
        NluClient::Mock(backend)
    }
}

#[async_trait]
impl UnderstandingBackend for NluClient {
    async fn understand(&self, text: &str) -> Result<ParseResult, RemoteError> {
        match self {
            NluClient::Remote(b) => b.understand(text).await,
            NluClient::Mock(b) => b.understand(text).await,
        }
    }

    fn provider(&self) -> Provider {
        match self {
            NluClient::Remote(b) => b.provider(),
            NluClient::Mock(b) => b.provider(),
        }
    }

    fn model(&self) -> &str {
        match self {
            NluClient::Remote(b) => b.model(),
            NluClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            NluClient::Remote(b) => b.host(),
            NluClient::Mock(b) => b.host(),
        }
    }
}
