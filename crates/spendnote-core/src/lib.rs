//! Spendnote Core Library
//!
//! Turns free-form expense utterances ("午餐花了35元", "coffee $4.50") into
//! structured records:
//! - Offline rule engine for amount, category and note extraction
//! - Optional remote language-understanding backends (OpenAI, DeepSeek,
//!   self-hosted OpenAI-compatible servers)
//! - Hybrid orchestrator with timeout, retry and local fallback
//! - API key storage in the OS credential store with local validation
//! - Layered configuration (embedded defaults, override file, environment)

pub mod config;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod models;
pub mod nlu;
pub mod parser;

/// Test utilities including mock understanding server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{BackendKind, Config, RemoteConfig, RoutingConfig};
pub use credentials::{
    validate, CredentialStore, KeyringStore, MemoryStore, Provider, Secret,
};
pub use error::{Error, RemoteError, Result};
pub use extractor::{CategoryRule, CategoryTable, LocalExtractor};
pub use models::{ApiKeyValidationResult, ParseResult, ParseSource, WEAK_CONFIDENCE};
pub use nlu::{MockBackend, NluClient, RemoteClient, UnderstandingBackend};
pub use parser::{ExpenseParser, SessionStats};
