//! Hybrid expense parser
//!
//! Routes each utterance to the remote backend when one is configured and a
//! credential is stored, and falls back to the local extractor on any remote
//! failure. `parse` never fails: the caller always gets a record back, and
//! the reason for the last fallback is kept for inspection.
//!
//! Session state (last error and counters) sits behind a mutex that is only
//! taken after the remote call has resolved, so dropping an in-flight `parse`
//! leaves it untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::RemoteError;
use crate::extractor::LocalExtractor;
use crate::models::ParseResult;
use crate::nlu::{NluClient, UnderstandingBackend};

/// Default bound on one remote attempt
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default base delay between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Backoff never grows past `retry_delay * 2^MAX_BACKOFF_SHIFT`
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Counters since construction or the last `reset`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Parses that went to the remote backend (retries count once)
    pub remote_attempts: u64,
    /// Remote parses that produced a result
    pub remote_successes: u64,
    /// Remote parses that fell back to the local extractor
    pub remote_failures: u64,
    /// Parses answered by the local extractor
    pub local_results: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    last_error: Option<RemoteError>,
    stats: SessionStats,
}

/// Expense parser combining remote understanding with local fallback
///
/// `Send + Sync`; share it behind an `Arc` to parse from several tasks.
pub struct ExpenseParser {
    extractor: LocalExtractor,
    backend: Option<NluClient>,
    store: Arc<dyn CredentialStore>,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
    skip_remote_above: Option<f64>,
    session: Mutex<SessionState>,
}

impl ExpenseParser {
    /// Create a parser with default timeout and no retries
    ///
    /// Without a backend every parse is answered locally.
    pub fn new(
        extractor: LocalExtractor,
        store: Arc<dyn CredentialStore>,
        backend: Option<NluClient>,
    ) -> Self {
        Self {
            extractor,
            backend,
            store,
            timeout: DEFAULT_REMOTE_TIMEOUT,
            max_retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            skip_remote_above: None,
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Create a parser from loaded configuration
    ///
    /// `backend` is ignored when remote parsing is disabled.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        backend: Option<NluClient>,
    ) -> Self {
        let backend = if config.remote.enabled { backend } else { None };
        Self::new(
            LocalExtractor::with_categories(config.categories.clone()),
            store,
            backend,
        )
        .with_timeout(config.remote.timeout)
        .with_retries(config.remote.max_retries, config.remote.retry_delay)
        .with_skip_remote_above(config.routing.skip_remote_above)
    }

    /// Bound each remote attempt by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry network failures up to `max_retries` times with exponential backoff
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Skip the remote call when the local result already reaches `threshold`
    pub fn with_skip_remote_above(mut self, threshold: Option<f64>) -> Self {
        self.skip_remote_above = threshold;
        self
    }

    /// The configured remote backend, if any
    pub fn backend(&self) -> Option<&NluClient> {
        self.backend.as_ref()
    }

    /// Parse `text`, preferring the remote backend
    pub async fn parse(&self, text: &str) -> ParseResult {
        let local = self.extractor.extract(text);

        let Some(backend) = &self.backend else {
            return self.answer_locally(local);
        };

        if let Some(threshold) = self.skip_remote_above {
            let confidence = local.confidence().unwrap_or(0.0);
            if confidence >= threshold {
                debug!(confidence, threshold, "Local result confident enough, skipping remote");
                return self.answer_locally(local);
            }
        }

        let provider = backend.provider();
        match self.store.get(provider) {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(provider = %provider, "No credential stored, using local extractor");
                return self.answer_locally(local);
            }
            Err(e) => {
                warn!(
                    provider = %provider,
                    error = %e,
                    "Credential store unavailable, using local extractor"
                );
                let mut session = self.session();
                session.stats.local_results += 1;
                session.last_error = Some(RemoteError::Unknown(format!(
                    "Could not read credential: {}",
                    e
                )));
                return local;
            }
        }

        let outcome = self.understand_with_retry(backend, text).await;

        let mut session = self.session();
        session.stats.remote_attempts += 1;
        match outcome {
            Ok(result) => {
                session.stats.remote_successes += 1;
                session.last_error = None;
                result
            }
            Err(error) => {
                warn!(
                    provider = %provider,
                    kind = error.kind(),
                    error = %error,
                    "Remote parse failed, falling back to local extractor"
                );
                session.stats.remote_failures += 1;
                session.stats.local_results += 1;
                session.last_error = Some(error);
                local
            }
        }
    }

    /// Parse with the local extractor only
    ///
    /// Does not touch session state.
    pub fn extract_local(&self, text: &str) -> ParseResult {
        self.extractor.extract(text)
    }

    /// Error behind the most recent fallback, if any
    pub fn last_error(&self) -> Option<RemoteError> {
        self.session().last_error.clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.session().stats
    }

    /// Clear the last error and session counters
    pub fn reset(&self) {
        *self.session() = SessionState::default();
    }

    fn answer_locally(&self, local: ParseResult) -> ParseResult {
        self.session().stats.local_results += 1;
        local
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        // State is plain counters; a panic mid-update cannot leave it invalid
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn understand_with_retry(
        &self,
        backend: &NluClient,
        text: &str,
    ) -> Result<ParseResult, RemoteError> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, backend.understand(text)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(RemoteError::NetworkFailure(format!(
                    "Timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            };

            match outcome {
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    debug!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying remote parse"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }
}
