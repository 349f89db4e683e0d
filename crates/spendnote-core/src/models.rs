//! Shared value types for parse results and key validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Results below this confidence are considered weak guesses
pub const WEAK_CONFIDENCE: f64 = 0.5;

/// Which extractor produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    /// Offline rule engine
    Local,
    /// Remote language-understanding service
    Remote,
}

impl ParseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ParseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured expense record extracted from one utterance
///
/// Built once per parse and never mutated afterwards; fields are read through
/// accessors. Only constructible through [`ParseResult::new`], so it is
/// serialized but never deserialized.
///
/// Equality ignores `parsed_at`.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    original_text: String,
    amount: Option<f64>,
    category: Option<String>,
    note: Option<String>,
    confidence: Option<f64>,
    source: ParseSource,
    parsed_at: DateTime<Utc>,
}

impl ParseResult {
    /// Build a result, normalizing empty strings to `None` and clamping confidence
    pub fn new(
        original_text: impl Into<String>,
        amount: Option<f64>,
        category: Option<String>,
        note: Option<String>,
        confidence: f64,
        source: ParseSource,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            amount,
            category: non_empty(category),
            note: non_empty(note),
            confidence: Some(confidence.clamp(0.0, 1.0)),
            source,
            parsed_at: Utc::now(),
        }
    }

    /// Verbatim input text
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn source(&self) -> ParseSource {
        self.source
    }

    /// When this result was produced
    pub fn parsed_at(&self) -> DateTime<Utc> {
        self.parsed_at
    }

    /// Whether the result clears the weak-guess threshold
    pub fn is_confident(&self) -> bool {
        self.confidence.unwrap_or(0.0) >= WEAK_CONFIDENCE
    }
}

impl PartialEq for ParseResult {
    fn eq(&self, other: &Self) -> bool {
        self.original_text == other.original_text
            && self.amount == other.amount
            && self.category == other.category
            && self.note == other.note
            && self.confidence == other.confidence
            && self.source == other.source
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Outcome of an offline API key format check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyValidationResult {
    pub is_valid: bool,
    /// Human-readable explanation when invalid (never contains the key)
    pub reason: Option<String>,
}

impl ApiKeyValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}
