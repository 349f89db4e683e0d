//! Test utilities for spendnote-core
//!
//! Provides a mock OpenAI-compatible chat completions server that can be
//! pointed at by `RemoteClient` in integration tests and demos.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::extractor::LocalExtractor;

/// How the mock server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Well-formed payload derived from the user message
    Valid,
    /// Assistant content that is not JSON
    Malformed,
    /// JSON payload without `amount` and `confidence`
    MissingFields,
    /// 429 with `Retry-After: 7`
    RateLimited,
    /// 500 Internal Server Error
    ServerError,
    /// Valid payload after the given delay
    Slow(Duration),
}

/// Retry-After seconds sent in `MockMode::RateLimited`
pub const MOCK_RETRY_AFTER: u64 = 7;

#[derive(Clone)]
struct ServerState {
    mode: MockMode,
    requests: Arc<AtomicUsize>,
    last_authorization: Arc<Mutex<Option<String>>>,
}

/// Mock chat completions server for testing
pub struct MockNluServer {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockNluServer {
    /// Start the mock server on an available port
    pub async fn start(mode: MockMode) -> Self {
        let state = ServerState {
            mode,
            requests: Arc::new(AtomicUsize::new(0)),
            last_authorization: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat_completions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of completion requests received
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Authorization header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockNluServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_chat_completions(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let text = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    match state.mode {
        MockMode::Valid => completion(valid_payload(text)),
        MockMode::Slow(delay) => {
            tokio::time::sleep(delay).await;
            completion(valid_payload(text))
        }
        MockMode::Malformed => completion("Sorry, I can't help with that.".to_string()),
        MockMode::MissingFields => completion(json!({ "category": "餐饮" }).to_string()),
        MockMode::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, MOCK_RETRY_AFTER.to_string())],
            "rate limited",
        )
            .into_response(),
        MockMode::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
    }
}

/// Payload mirroring the local extractor with high confidence
fn valid_payload(text: &str) -> String {
    let local = LocalExtractor::new().extract(text);
    json!({
        "amount": local.amount(),
        "category": local.category(),
        "note": local.note(),
        "confidence": 0.95,
    })
    .to_string()
}

fn completion(content: String) -> Response {
    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": "mock",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatRequestMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}
