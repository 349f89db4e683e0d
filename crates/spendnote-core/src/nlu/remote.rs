//! HTTP client for OpenAI-compatible chat completion endpoints
//!
//! Works with any server implementing `POST /v1/chat/completions`:
//! - OpenAI (https://api.openai.com)
//! - DeepSeek (https://api.deepseek.com)
//! - Self-hosted servers such as vLLM, LocalAI or llama-server

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credentials::{CredentialStore, Provider, Secret};
use crate::error::{RemoteError, Result};
use crate::extractor::CategoryTable;
use crate::models::{ParseResult, ParseSource};

use super::parsing::parse_expense_payload;
use super::UnderstandingBackend;

/// System prompt template; `{{categories}}` is replaced with the label list
const PARSE_EXPENSE_PROMPT: &str = include_str!("../../../../prompts/parse_expense.md");

/// Remote understanding client
///
/// The API key is read from the credential store on every call, so a key
/// rotated or deleted mid-session takes effect on the next parse.
#[derive(Clone)]
pub struct RemoteClient {
    http_client: Client,
    base_url: String,
    model: String,
    provider: Provider,
    store: Arc<dyn CredentialStore>,
    system_prompt: Arc<str>,
}

impl RemoteClient {
    /// Create a client for `provider` at `base_url`
    ///
    /// `timeout` bounds each HTTP request end to end.
    pub fn new(
        provider: Provider,
        base_url: &str,
        model: &str,
        store: Arc<dyn CredentialStore>,
        categories: &CategoryTable,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            provider,
            store,
            system_prompt: render_prompt(categories).into(),
        })
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Current key for this client's provider
    fn credential(&self) -> std::result::Result<Secret, RemoteError> {
        match self.store.get(self.provider) {
            Ok(Some(secret)) => Ok(secret),
            Ok(None) => Err(RemoteError::MissingCredential(self.provider)),
            Err(e) => Err(RemoteError::Unknown(format!(
                "Could not read credential: {}",
                e
            ))),
        }
    }

    /// Make a chat completion request and return the assistant content
    async fn chat_completion(
        &self,
        api_key: &Secret,
        text: &str,
    ) -> std::result::Result<String, RemoteError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &*self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            return Err(status_error(status, retry_after));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RemoteError::InvalidResponse("No choices in completion response".into()))
    }
}

#[async_trait]
impl UnderstandingBackend for RemoteClient {
    async fn understand(&self, text: &str) -> std::result::Result<ParseResult, RemoteError> {
        let api_key = self.credential()?;

        debug!(
            provider = %self.provider,
            model = %self.model,
            host = %self.base_url,
            "Sending remote parse request"
        );

        let content = self.chat_completion(&api_key, text).await.inspect_err(|e| {
            warn!(provider = %self.provider, kind = e.kind(), error = %e, "Remote request failed");
        })?;
        let payload = parse_expense_payload(&content)?;

        Ok(ParseResult::new(
            text,
            payload.amount,
            payload.category,
            payload.note,
            payload.confidence,
            ParseSource::Remote,
        ))
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

fn render_prompt(categories: &CategoryTable) -> String {
    let labels = categories
        .names()
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    PARSE_EXPENSE_PROMPT.replace("{{categories}}", &labels)
}

/// Map a non-success HTTP status to a remote error
fn status_error(status: StatusCode, retry_after: Option<u64>) -> RemoteError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        RemoteError::RateLimited { retry_after }
    } else if status.is_server_error() {
        RemoteError::NetworkFailure(format!("Server error {}", status))
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        RemoteError::Unknown(format!("Credential rejected by provider ({})", status))
    } else {
        RemoteError::Unknown(format!("Unexpected status {}", status))
    }
}

/// Seconds from a `Retry-After` header (HTTP-date values are ignored)
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
