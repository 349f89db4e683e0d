//! Config command implementation

use std::path::Path;

use anyhow::Result;
use spendnote_core::config::default_config_path;
use spendnote_core::Config;

pub fn cmd_config(config: &Config, explicit_path: Option<&Path>) -> Result<()> {
    println!("{}", format_config(config, explicit_path));
    Ok(())
}

/// Human-readable dump of the effective configuration
pub fn format_config(config: &Config, explicit_path: Option<&Path>) -> String {
    let source = match explicit_path {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "(built-in defaults)".to_string(),
        },
    };

    let remote = &config.remote;
    let mut lines = vec![
        String::new(),
        "⚙️  Spendnote Configuration".to_string(),
        "   ─────────────────────────────────────────".to_string(),
        format!("   Source:       {}", source),
        String::new(),
        format!(
            "   Remote:       {}",
            if remote.enabled { "enabled" } else { "disabled" }
        ),
        format!("   Backend:      {}", remote.backend.as_str()),
        format!("   Provider:     {}", remote.provider),
        format!(
            "   Base URL:     {}",
            remote.effective_base_url().unwrap_or("(not set)")
        ),
        format!("   Model:        {}", remote.effective_model()),
        format!("   Timeout:      {}s", remote.timeout.as_secs()),
        format!(
            "   Retries:      {} (base delay {}ms)",
            remote.max_retries,
            remote.retry_delay.as_millis()
        ),
        format!(
            "   Skip remote:  {}",
            config
                .routing
                .skip_remote_above
                .map(|t| format!("local confidence >= {:.2}", t))
                .unwrap_or_else(|| "never".to_string())
        ),
        String::new(),
        "   Categories:".to_string(),
    ];

    for rule in config.categories.rules() {
        lines.push(format!(
            "     {:<8} {}",
            rule.name,
            rule.keywords.join(", ")
        ));
    }

    lines.join("\n")
}
