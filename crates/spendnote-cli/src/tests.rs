//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::sync::Arc;

use spendnote_core::test_utils::{MockMode, MockNluServer};
use spendnote_core::{
    BackendKind, Config, CredentialStore, MemoryStore, ParseResult, ParseSource, Provider,
    RemoteError, Secret,
};

use crate::commands::{self, format_config, key_status_lines, render_result};

const DEEPSEEK_KEY: &str = "sk-0123456789abcdef0123456789abcdef";

fn local_result(text: &str) -> ParseResult {
    Config::default().build_parser(Arc::new(MemoryStore::new())).unwrap().extract_local(text)
}

// ========== Key Command Tests ==========

#[test]
fn test_cmd_key_set_valid() {
    let store = MemoryStore::new();
    commands::cmd_key_set(&store, Provider::DeepSeek, DEEPSEEK_KEY, false).unwrap();
    assert_eq!(
        store.get(Provider::DeepSeek).unwrap().unwrap().expose(),
        DEEPSEEK_KEY
    );
}

#[test]
fn test_cmd_key_set_rejects_invalid() {
    let store = MemoryStore::new();
    let err = commands::cmd_key_set(&store, Provider::DeepSeek, "sk-short", false).unwrap_err();
    assert!(err.to_string().contains("Refusing to store"));
    assert!(!err.to_string().contains("sk-short"));
    assert!(!store.contains(Provider::DeepSeek));
}

#[test]
fn test_cmd_key_set_force() {
    let store = MemoryStore::new();
    commands::cmd_key_set(&store, Provider::DeepSeek, "sk-short", true).unwrap();
    assert!(store.contains(Provider::DeepSeek));
}

#[test]
fn test_cmd_key_validate() {
    assert!(commands::cmd_key_validate(Provider::DeepSeek, DEEPSEEK_KEY).is_ok());
    assert!(commands::cmd_key_validate(Provider::DeepSeek, "").is_err());
    assert!(commands::cmd_key_validate(Provider::OpenAi, DEEPSEEK_KEY).is_err());
}

#[test]
fn test_key_status_never_prints_key() {
    let store = MemoryStore::with_key(Provider::OpenAi, Secret::new("sk-supersecret"));
    let lines = key_status_lines(&store, None);
    assert_eq!(lines.len(), Provider::all().len());
    assert!(lines[0].starts_with("openai"));
    assert!(lines[0].ends_with("stored"));
    assert!(lines[1].ends_with("not stored"));
    assert!(lines.iter().all(|l| !l.contains("supersecret")));

    let single = key_status_lines(&store, Some(Provider::DeepSeek));
    assert_eq!(single.len(), 1);
}

#[test]
fn test_cmd_key_delete_is_idempotent() {
    let store = MemoryStore::with_key(Provider::DeepSeek, Secret::new(DEEPSEEK_KEY));
    commands::cmd_key_delete(&store, Provider::DeepSeek).unwrap();
    commands::cmd_key_delete(&store, Provider::DeepSeek).unwrap();
    assert!(!store.contains(Provider::DeepSeek));
}

#[test]
fn test_secret_or_stdin_prefers_argument() {
    let secret = commands::secret_or_stdin(Some(DEEPSEEK_KEY.to_string())).unwrap();
    assert_eq!(secret, DEEPSEEK_KEY);
}

// ========== Parse Command Tests ==========

#[test]
fn test_render_result_text() {
    let result = local_result("今天买菜花了50元");
    let output = render_result(&result, None, false).unwrap();
    assert!(output.contains("50.00"));
    assert!(output.contains("餐饮"));
    assert!(output.contains("(local)"));
    assert!(!output.contains("Remote parse failed"));
}

#[test]
fn test_render_result_marks_low_confidence() {
    let result = local_result("今天天气很好");
    let output = render_result(&result, None, false).unwrap();
    assert!(output.contains("Amount:     -"));
    assert!(output.contains("Low confidence"));
}

#[test]
fn test_render_result_json_with_fallback() {
    let result = local_result("coffee $4.50");
    let error = RemoteError::RateLimited {
        retry_after: Some(7),
    };
    let output = render_result(&result, Some(&error), true).unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["amount"], 4.5);
    assert_eq!(value["source"], "local");
    assert_eq!(value["original_text"], "coffee $4.50");
    assert_eq!(value["fallback_reason"]["kind"], "rate_limited");
}

#[tokio::test]
async fn test_cmd_parse_local_only() {
    let config = Config::default();
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    commands::cmd_parse(&config, store, "午饭35元", true, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cmd_parse_local_ignores_remote_config() {
    let mut config = Config::default();
    config.remote.provider = Provider::Custom;
    config.remote.base_url = None;
    assert!(config.build_client(Arc::new(MemoryStore::new())).is_err());

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    commands::cmd_parse(&config, store, "午饭35元", true, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cmd_parse_against_mock_server() {
    let server = MockNluServer::start(MockMode::Valid).await;
    let mut config = Config::default();
    config.remote.base_url = Some(server.url());
    config.remote.max_retries = 0;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_key(
        Provider::DeepSeek,
        Secret::new(DEEPSEEK_KEY),
    ));
    commands::cmd_parse(&config, store, "午饭35元", false, true)
        .await
        .unwrap();
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_mock_backend_parse_is_remote() {
    let mut config = Config::default();
    config.remote.backend = BackendKind::Mock;
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_key(
        Provider::DeepSeek,
        Secret::new(DEEPSEEK_KEY),
    ));

    let parser = config.build_parser(store).unwrap();
    assert_eq!(parser.parse("午饭35元").await.source(), ParseSource::Remote);
}

// ========== Config Command Tests ==========

#[test]
fn test_format_config_defaults() {
    let config = Config::default();
    let output = format_config(&config, None);
    assert!(output.contains("Provider:     deepseek"));
    assert!(output.contains("https://api.deepseek.com"));
    assert!(output.contains("Skip remote:  never"));
    assert!(output.contains("餐饮"));
}

#[test]
fn test_format_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[remote]\nprovider = \"custom\"\nbase_url = \"http://localhost:8080\"\n\n[routing]\nskip_remote_above = 0.75"
    )
    .unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let mut config = Config::default();
    config.merge_toml(&contents).unwrap();
    config.apply_env_overrides(|_| None).unwrap();
    let output = format_config(&config, Some(file.path()));
    assert!(output.contains("Provider:     custom"));
    assert!(output.contains("http://localhost:8080"));
    assert!(output.contains("local confidence >= 0.75"));
    assert!(output.contains(&file.path().display().to_string()));
}

#[test]
fn test_cmd_config() {
    assert!(commands::cmd_config(&Config::default(), None).is_ok());
}
