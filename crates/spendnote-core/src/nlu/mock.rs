//! Scripted backend for tests and offline demos
//!
//! Answers without touching the network. A succeeding mock runs the local
//! extractor and reports the result as remote, so routing and fallback can be
//! exercised deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::Provider;
use crate::error::RemoteError;
use crate::extractor::LocalExtractor;
use crate::models::{ParseResult, ParseSource};

use super::UnderstandingBackend;

/// Confidence reported by a succeeding mock
const MOCK_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone)]
enum Behavior {
    Succeed,
    Fail(RemoteError),
    /// Fail the first `n` calls, then succeed
    FailFirst(usize, RemoteError),
    /// Never resolves; the caller's timeout has to cut it off
    Hang,
}

/// Mock understanding backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: Behavior,
    provider: Provider,
    extractor: LocalExtractor,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that always succeeds
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Succeed,
            provider: Provider::DeepSeek,
            extractor: LocalExtractor::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always fails with `error`
    pub fn failing(error: RemoteError) -> Self {
        Self {
            behavior: Behavior::Fail(error),
            ..Self::new()
        }
    }

    /// Create a mock that fails the first `times` calls, then succeeds
    pub fn failing_times(times: usize, error: RemoteError) -> Self {
        Self {
            behavior: Behavior::FailFirst(times, error),
            ..Self::new()
        }
    }

    /// Create a mock whose calls never complete
    pub fn hanging() -> Self {
        Self {
            behavior: Behavior::Hang,
            ..Self::new()
        }
    }

    /// Report `provider` as the credential this backend needs
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Use a custom extractor for succeeding calls
    pub fn with_extractor(mut self, extractor: LocalExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Number of `understand` calls so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn succeed(&self, text: &str) -> ParseResult {
        let local = self.extractor.extract(text);
        ParseResult::new(
            text,
            local.amount(),
            local.category().map(str::to_string),
            local.note().map(str::to_string),
            MOCK_CONFIDENCE,
            ParseSource::Remote,
        )
    }
}

#[async_trait]
impl UnderstandingBackend for MockBackend {
    async fn understand(&self, text: &str) -> Result<ParseResult, RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Succeed => Ok(self.succeed(text)),
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::FailFirst(times, error) if call < *times => Err(error.clone()),
            Behavior::FailFirst(..) => Ok(self.succeed(text)),
            Behavior::Hang => std::future::pending().await,
        }
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
