//! Offline API key format checks
//!
//! Pure functions: no I/O, no network, no logging of the candidate.

use super::Provider;
use crate::models::ApiKeyValidationResult;

/// Character classes allowed in the key body
#[derive(Debug, Clone, Copy)]
enum Charset {
    /// `[A-Za-z0-9]`
    Alphanumeric,
    /// `[A-Za-z0-9_-]`
    UrlSafe,
    /// Printable ASCII without whitespace
    Printable,
}

impl Charset {
    fn allows(&self, c: char) -> bool {
        match self {
            Self::Alphanumeric => c.is_ascii_alphanumeric(),
            Self::UrlSafe => c.is_ascii_alphanumeric() || c == '_' || c == '-',
            Self::Printable => c.is_ascii_graphic(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Alphanumeric => "letters and digits",
            Self::UrlSafe => "letters, digits, '-' and '_'",
            Self::Printable => "printable ASCII characters",
        }
    }
}

/// Format policy for one provider
#[derive(Debug, Clone, Copy)]
struct KeyPolicy {
    prefix: Option<&'static str>,
    min_len: usize,
    max_len: Option<usize>,
    charset: Charset,
}

fn policy_for(provider: Provider) -> KeyPolicy {
    match provider {
        Provider::OpenAi => KeyPolicy {
            prefix: Some("sk-"),
            min_len: 40,
            max_len: None,
            charset: Charset::UrlSafe,
        },
        // sk- followed by 32 characters
        Provider::DeepSeek => KeyPolicy {
            prefix: Some("sk-"),
            min_len: 35,
            max_len: Some(35),
            charset: Charset::Alphanumeric,
        },
        Provider::Custom => KeyPolicy {
            prefix: None,
            min_len: 8,
            max_len: None,
            charset: Charset::Printable,
        },
    }
}

/// Check whether `secret` looks like a usable key for `provider`
///
/// Only format is checked; a well-formed key may still be rejected by the
/// provider at request time.
pub fn validate(secret: &str, provider: Provider) -> ApiKeyValidationResult {
    if secret.trim().is_empty() {
        return ApiKeyValidationResult::invalid("API key is empty");
    }

    if secret.trim() != secret {
        return ApiKeyValidationResult::invalid(
            "API key has leading or trailing whitespace",
        );
    }

    let policy = policy_for(provider);

    let body = match policy.prefix {
        Some(prefix) => match secret.strip_prefix(prefix) {
            Some(body) => body,
            None => {
                return ApiKeyValidationResult::invalid(format!(
                    "{} keys must start with '{}'",
                    provider, prefix
                ))
            }
        },
        None => secret,
    };

    let len = secret.chars().count();
    if len < policy.min_len {
        return ApiKeyValidationResult::invalid(format!(
            "{} keys must be at least {} characters (got {})",
            provider, policy.min_len, len
        ));
    }
    if let Some(max_len) = policy.max_len {
        if len > max_len {
            return ApiKeyValidationResult::invalid(format!(
                "{} keys must be at most {} characters (got {})",
                provider, max_len, len
            ));
        }
    }

    if let Some(position) = body.chars().position(|c| !policy.charset.allows(c)) {
        let offset = policy.prefix.map_or(0, str::len);
        return ApiKeyValidationResult::invalid(format!(
            "{} keys may only contain {} (invalid character at position {})",
            provider,
            policy.charset.describe(),
            offset + position + 1
        ));
    }

    ApiKeyValidationResult::valid()
}
