//! Layered configuration
//!
//! Resolution order (later wins):
//! 1. Embedded defaults (`config/spendnote.toml`, compiled into the binary)
//! 2. Override file (`--config PATH`, else `<config_dir>/spendnote/config.toml`)
//! 3. `SPENDNOTE_*` environment variables
//!
//! Both files are parsed into raw structs with every key optional and folded
//! onto the typed `Config`, so an override only needs the keys it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::credentials::{CredentialStore, Provider};
use crate::error::{Error, Result};
use crate::extractor::{CategoryRule, CategoryTable, LocalExtractor};
use crate::nlu::{MockBackend, NluClient, RemoteClient};
use crate::parser::ExpenseParser;

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../config/spendnote.toml");

/// Upper bound on configured retries
const MAX_RETRIES_LIMIT: u32 = 10;

/// Which understanding backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI-compatible chat completions over HTTP
    OpenAiCompatible,
    /// Scripted offline backend
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai_compatible" | "openai" | "remote" => Ok(Self::OpenAiCompatible),
            "mock" => Ok(Self::Mock),
            other => Err(format!(
                "Unknown backend '{}' (expected openai_compatible or mock)",
                other
            )),
        }
    }
}

/// Remote understanding settings
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub backend: BackendKind,
    pub provider: Provider,
    /// Explicit endpoint; `None` uses the provider default
    pub base_url: Option<String>,
    /// Explicit model; `None` uses the provider default
    pub model: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::OpenAiCompatible,
            provider: Provider::DeepSeek,
            base_url: None,
            model: None,
            timeout: Duration::from_secs(10),
            max_retries: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl RemoteConfig {
    /// Endpoint in effect (explicit value, else provider default)
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.provider.default_base_url())
    }

    /// Model in effect (explicit value, else provider default)
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// Local/remote routing settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingConfig {
    /// Skip the remote call when local confidence reaches this value
    pub skip_remote_above: Option<f64>,
}

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub remote: RemoteConfig,
    pub routing: RoutingConfig,
    pub categories: CategoryTable,
}

impl Config {
    /// Load embedded defaults, the override file and environment overrides
    ///
    /// An explicit `path` must exist; the default override location is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULT_CONFIG)?;

        let override_path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = override_path {
            debug!(path = %path.display(), "Loading config override");
            let content = fs::read_to_string(&path)?;
            config.merge_toml(&content)?;
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge_toml(content)?;
        Ok(config)
    }

    /// Fold a TOML document onto this configuration
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if let Some(remote) = raw.remote {
            if let Some(enabled) = remote.enabled {
                self.remote.enabled = enabled;
            }
            if let Some(backend) = remote.backend {
                self.remote.backend = backend.parse().map_err(Error::Config)?;
            }
            if let Some(provider) = remote.provider {
                self.remote.provider = provider.parse().map_err(Error::Config)?;
            }
            if let Some(base_url) = remote.base_url {
                self.remote.base_url = Some(check_base_url(&base_url)?);
            }
            if let Some(model) = remote.model {
                self.remote.model = non_empty(model);
            }
            if let Some(secs) = remote.timeout_secs {
                self.remote.timeout = check_timeout(secs)?;
            }
            if let Some(retries) = remote.max_retries {
                self.remote.max_retries = check_retries(retries)?;
            }
            if let Some(ms) = remote.retry_delay_ms {
                self.remote.retry_delay = Duration::from_millis(ms);
            }
        }

        if let Some(routing) = raw.routing {
            if let Some(threshold) = routing.skip_remote_above {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(Error::Config(format!(
                        "skip_remote_above must be between 0 and 1, got {}",
                        threshold
                    )));
                }
                self.routing.skip_remote_above = Some(threshold);
            }
        }

        if let Some(categories) = raw.categories {
            self.categories = CategoryTable::new(categories)?;
        }

        Ok(())
    }

    /// Apply `SPENDNOTE_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SPENDNOTE_REMOTE") {
            self.remote.enabled = parse_switch(&value).ok_or_else(|| {
                Error::Config(format!("SPENDNOTE_REMOTE must be on or off, got '{}'", value))
            })?;
        }
        if let Some(value) = lookup("SPENDNOTE_BACKEND") {
            self.remote.backend = value.parse().map_err(Error::Config)?;
        }
        if let Some(value) = lookup("SPENDNOTE_PROVIDER") {
            self.remote.provider = value.parse().map_err(Error::Config)?;
        }
        if let Some(value) = lookup("SPENDNOTE_BASE_URL") {
            self.remote.base_url = Some(check_base_url(&value)?);
        }
        if let Some(value) = lookup("SPENDNOTE_MODEL") {
            self.remote.model = non_empty(value);
        }
        if let Some(value) = lookup("SPENDNOTE_TIMEOUT_SECS") {
            let secs = value.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "SPENDNOTE_TIMEOUT_SECS must be a whole number, got '{}'",
                    value
                ))
            })?;
            self.remote.timeout = check_timeout(secs)?;
        }
        Ok(())
    }

    /// Build the configured understanding client
    ///
    /// Returns `None` when remote parsing is disabled.
    pub fn build_client(&self, store: Arc<dyn CredentialStore>) -> Result<Option<NluClient>> {
        if !self.remote.enabled {
            return Ok(None);
        }

        let client = match self.remote.backend {
            BackendKind::Mock => NluClient::Mock(
                MockBackend::new()
                    .with_provider(self.remote.provider)
                    .with_extractor(LocalExtractor::with_categories(self.categories.clone())),
            ),
            BackendKind::OpenAiCompatible => {
                let base_url = self.remote.effective_base_url().ok_or_else(|| {
                    Error::Config(format!(
                        "Provider '{}' needs remote.base_url (or SPENDNOTE_BASE_URL)",
                        self.remote.provider
                    ))
                })?;
                NluClient::Remote(RemoteClient::new(
                    self.remote.provider,
                    base_url,
                    self.remote.effective_model(),
                    store,
                    &self.categories,
                    self.remote.timeout,
                )?)
            }
        };
        Ok(Some(client))
    }

    /// Build a parser wired to `store`
    pub fn build_parser(&self, store: Arc<dyn CredentialStore>) -> Result<ExpenseParser> {
        let client = self.build_client(Arc::clone(&store))?;
        Ok(ExpenseParser::from_config(self, store, client))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spendnote").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    remote: Option<RawRemote>,
    routing: Option<RawRouting>,
    categories: Option<Vec<CategoryRule>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRemote {
    enabled: Option<bool>,
    backend: Option<String>,
    provider: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRouting {
    skip_remote_above: Option<f64>,
}

fn check_base_url(value: &str) -> Result<String> {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(Error::Config(format!(
            "base_url must start with http:// or https://, got '{}'",
            value
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn check_timeout(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config("timeout_secs must be at least 1".into()));
    }
    Ok(Duration::from_secs(secs))
}

fn check_retries(retries: u32) -> Result<u32> {
    if retries > MAX_RETRIES_LIMIT {
        return Err(Error::Config(format!(
            "max_retries must be at most {}, got {}",
            MAX_RETRIES_LIMIT, retries
        )));
    }
    Ok(retries)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryStore;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_default_config() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert!(config.remote.enabled);
        assert_eq!(config.remote.backend, BackendKind::OpenAiCompatible);
        assert_eq!(config.remote.provider, Provider::DeepSeek);
        assert_eq!(
            config.remote.effective_base_url(),
            Some("https://api.deepseek.com")
        );
        assert_eq!(config.remote.effective_model(), "deepseek-chat");
        assert_eq!(config.remote.timeout, Duration::from_secs(10));
        assert_eq!(config.routing.skip_remote_above, None);
        assert_eq!(config.categories, CategoryTable::builtin());
    }

    #[test]
    fn test_partial_override_keeps_other_keys() {
        let mut config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        config
            .merge_toml(
                r#"
                [remote]
                provider = "openai"
                timeout_secs = 3

                [routing]
                skip_remote_above = 0.8
                "#,
            )
            .unwrap();
        assert_eq!(config.remote.provider, Provider::OpenAi);
        assert_eq!(config.remote.timeout, Duration::from_secs(3));
        assert_eq!(config.remote.max_retries, 1);
        assert_eq!(config.remote.effective_model(), "gpt-4o-mini");
        assert_eq!(config.routing.skip_remote_above, Some(0.8));
    }

    #[test]
    fn test_custom_categories() {
        let config = Config::from_toml(
            r#"
            [[categories]]
            name = "Dining"
            keywords = ["lunch", "Coffee"]

            [[categories]]
            name = "Transport"
            keywords = ["taxi"]
            "#,
        )
        .unwrap();
        assert_eq!(config.categories.names(), vec!["Dining", "Transport"]);
        assert_eq!(config.categories.classify("COFFEE run"), Some("Dining"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[remote]\ntimeout_secs = 0").is_err());
        assert!(Config::from_toml("[remote]\nprovider = \"gemini\"").is_err());
        assert!(Config::from_toml("[remote]\nbackend = \"grpc\"").is_err());
        assert!(Config::from_toml("[remote]\nbase_url = \"ftp://host\"").is_err());
        assert!(Config::from_toml("[remote]\nmax_retries = 99").is_err());
        assert!(Config::from_toml("[routing]\nskip_remote_above = 1.5").is_err());
        assert!(Config::from_toml("[remote]\ntypo = true").is_err());
        assert!(Config::from_toml("not toml [").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("SPENDNOTE_REMOTE", "off"),
                ("SPENDNOTE_PROVIDER", "custom"),
                ("SPENDNOTE_BASE_URL", "http://localhost:8000/"),
                ("SPENDNOTE_MODEL", "qwen2.5"),
                ("SPENDNOTE_TIMEOUT_SECS", "4"),
                ("SPENDNOTE_BACKEND", "mock"),
            ]))
            .unwrap();
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.provider, Provider::Custom);
        assert_eq!(
            config.remote.effective_base_url(),
            Some("http://localhost:8000")
        );
        assert_eq!(config.remote.effective_model(), "qwen2.5");
        assert_eq!(config.remote.timeout, Duration::from_secs(4));
        assert_eq!(config.remote.backend, BackendKind::Mock);
    }

    #[test]
    fn test_bad_env_values_rejected() {
        let mut config = Config::default();
        assert!(config
            .apply_env_overrides(env(&[("SPENDNOTE_REMOTE", "maybe")]))
            .is_err());
        assert!(config
            .apply_env_overrides(env(&[("SPENDNOTE_TIMEOUT_SECS", "soon")]))
            .is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[remote]\nbackend = \"mock\"\nmax_retries = 0").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.remote.max_retries, 0);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(missing.as_path())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_build_client() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());

        let mut config = Config::default();
        assert!(matches!(
            config.build_client(Arc::clone(&store)).unwrap(),
            Some(NluClient::Remote(_))
        ));

        config.remote.backend = BackendKind::Mock;
        assert!(matches!(
            config.build_client(Arc::clone(&store)).unwrap(),
            Some(NluClient::Mock(_))
        ));

        config.remote.enabled = false;
        assert!(config.build_client(Arc::clone(&store)).unwrap().is_none());
    }

    #[test]
    fn test_custom_provider_needs_base_url() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let mut config = Config::default();
        config.remote.provider = Provider::Custom;
        assert!(matches!(config.build_client(store), Err(Error::Config(_))));
    }
}
