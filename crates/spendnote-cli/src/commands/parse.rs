//! Parse command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use spendnote_core::{Config, CredentialStore, LocalExtractor, ParseResult, RemoteError};

pub async fn cmd_parse(
    config: &Config,
    store: Arc<dyn CredentialStore>,
    text: &str,
    local: bool,
    json: bool,
) -> Result<()> {
    // The local path needs no remote configuration
    if local {
        let result = LocalExtractor::with_categories(config.categories.clone()).extract(text);
        println!("{}", render_result(&result, None, json)?);
        return Ok(());
    }

    let parser = config
        .build_parser(store)
        .context("Failed to set up parser")?;
    let result = parser.parse(text).await;

    let output = render_result(&result, parser.last_error().as_ref(), json)?;
    println!("{}", output);
    Ok(())
}

/// Format a result for display, noting the fallback reason if any
pub fn render_result(
    result: &ParseResult,
    fallback: Option<&RemoteError>,
    json: bool,
) -> Result<String> {
    if json {
        let mut value = serde_json::to_value(result).context("Failed to serialize result")?;
        if let Some(error) = fallback {
            value["fallback_reason"] = json!({
                "kind": error.kind(),
                "message": error.to_string(),
            });
        }
        return serde_json::to_string_pretty(&value).context("Failed to format JSON");
    }

    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(format!("   Input:      {}", result.original_text()));
    lines.push(format!(
        "   Amount:     {}",
        result
            .amount()
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!("   Category:   {}", result.category().unwrap_or("-")));
    lines.push(format!("   Note:       {}", result.note().unwrap_or("-")));
    lines.push(format!(
        "   Confidence: {:.2} ({})",
        result.confidence().unwrap_or(0.0),
        result.source()
    ));
    if !result.is_confident() {
        lines.push("   ⚠️  Low confidence, please double-check".to_string());
    }
    if let Some(error) = fallback {
        lines.push(format!(
            "   ⚠️  Remote parse failed ({}): {}; used local rules",
            error.kind(),
            error
        ));
    }
    Ok(lines.join("\n"))
}
