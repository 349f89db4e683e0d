//! Response parsing for the remote understanding service
//!
//! Models often wrap the JSON payload in prose or code fences, so the first
//! `{` through the last `}` is taken as the payload. The payload is then
//! checked field by field rather than deserialized into a struct, so a wrong
//! type is reported by name instead of as a generic serde error.

use serde_json::{Map, Value};

use crate::error::RemoteError;

/// Longest slice of a raw model reply quoted in an error message
const MAX_RAW_IN_ERROR: usize = 200;

/// Fields of a validated expense payload
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpensePayload {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub confidence: f64,
}

/// Extract and validate the expense payload in an assistant reply
pub(crate) fn parse_expense_payload(content: &str) -> Result<ExpensePayload, RemoteError> {
    let json_str = extract_json_object(content)?;
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        RemoteError::InvalidResponse(format!(
            "Invalid JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let Value::Object(map) = value else {
        return Err(RemoteError::InvalidResponse(
            "Model reply is not a JSON object".into(),
        ));
    };

    Ok(ExpensePayload {
        amount: amount_field(&map)?,
        category: required_string_or_null(&map, "category")?,
        note: optional_string(&map, "note")?,
        confidence: confidence_field(&map)?,
    })
}

fn extract_json_object(content: &str) -> Result<&str, RemoteError> {
    let content = content.trim();
    let start = content.find('{');
    let end = content.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&content[s..=e]),
        _ => Err(RemoteError::InvalidResponse(format!(
            "No JSON found in model reply | Raw: {}",
            truncate(content)
        ))),
    }
}

fn amount_field(map: &Map<String, Value>) -> Result<Option<f64>, RemoteError> {
    match map.get("amount") {
        None => Err(missing("amount")),
        Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            let amount = n
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| {
                    RemoteError::InvalidResponse(format!(
                        "Field 'amount' must be a non-negative number, got {}",
                        n
                    ))
                })?;
            Ok(Some(amount))
        }
        Some(other) => Err(wrong_type("amount", "a number or null", other)),
    }
}

fn confidence_field(map: &Map<String, Value>) -> Result<f64, RemoteError> {
    match map.get("confidence") {
        None => Err(missing("confidence")),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| (0.0..=1.0).contains(v))
            .ok_or_else(|| {
                RemoteError::InvalidResponse(format!(
                    "Field 'confidence' must be between 0 and 1, got {}",
                    n
                ))
            }),
        Some(other) => Err(wrong_type("confidence", "a number", other)),
    }
}

fn required_string_or_null(
    map: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, RemoteError> {
    match map.get(field) {
        None => Err(missing(field)),
        Some(value) => string_or_null(field, value),
    }
}

fn optional_string(map: &Map<String, Value>, field: &str) -> Result<Option<String>, RemoteError> {
    match map.get(field) {
        None => Ok(None),
        Some(value) => string_or_null(field, value),
    }
}

fn string_or_null(field: &str, value: &Value) -> Result<Option<String>, RemoteError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(wrong_type(field, "a string or null", other)),
    }
}

fn missing(field: &str) -> RemoteError {
    RemoteError::InvalidResponse(format!("Missing required field '{}'", field))
}

fn wrong_type(field: &str, expected: &str, got: &Value) -> RemoteError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    RemoteError::InvalidResponse(format!(
        "Field '{}' must be {}, got {}",
        field, expected, got
    ))
}

fn truncate(raw: &str) -> String {
    if raw.len() <= MAX_RAW_IN_ERROR {
        return raw.to_string();
    }
    let mut cut = MAX_RAW_IN_ERROR;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &raw[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_payload() {
        let payload = parse_expense_payload(
            r#"{"amount": 35.5, "category": "餐饮", "note": "午饭", "confidence": 0.9}"#,
        )
        .unwrap();
        assert_eq!(payload.amount, Some(35.5));
        assert_eq!(payload.category.as_deref(), Some("餐饮"));
        assert_eq!(payload.note.as_deref(), Some("午饭"));
        assert_eq!(payload.confidence, 0.9);
    }

    #[test]
    fn test_parse_payload_wrapped_in_prose() {
        let content = "Sure! Here you go:\n```json\n{\"amount\": 12, \"category\": null, \"confidence\": 0.6}\n```";
        let payload = parse_expense_payload(content).unwrap();
        assert_eq!(payload.amount, Some(12.0));
        assert_eq!(payload.category, None);
        assert_eq!(payload.note, None);
    }

    #[test]
    fn test_null_amount_allowed() {
        let payload =
            parse_expense_payload(r#"{"amount": null, "category": null, "confidence": 0.2}"#)
                .unwrap();
        assert_eq!(payload.amount, None);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = parse_expense_payload(r#"{"category": "餐饮", "confidence": 0.9}"#).unwrap_err();
        assert_eq!(
            err,
            RemoteError::InvalidResponse("Missing required field 'amount'".into())
        );

        let err = parse_expense_payload(r#"{"amount": 5, "category": "餐饮"}"#).unwrap_err();
        assert!(err.to_string().contains("confidence"));

        let err = parse_expense_payload(r#"{"amount": 5, "confidence": 0.5}"#).unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = parse_expense_payload(r#"{"amount": "35", "category": null, "confidence": 0.9}"#)
            .unwrap_err();
        assert!(err.to_string().contains("'amount' must be a number or null, got a string"));

        let err = parse_expense_payload(r#"{"amount": 3, "category": 7, "confidence": 0.9}"#)
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));

        let err = parse_expense_payload(r#"{"amount": 3, "category": null, "confidence": "high"}"#)
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(
            parse_expense_payload(r#"{"amount": -4, "category": null, "confidence": 0.9}"#)
                .is_err()
        );
        assert!(
            parse_expense_payload(r#"{"amount": 4, "category": null, "confidence": 1.5}"#)
                .is_err()
        );
    }

    #[test]
    fn test_no_json_rejected() {
        let err = parse_expense_payload("I could not find an expense.").unwrap_err();
        assert!(err.to_string().contains("No JSON found"));
        assert!(parse_expense_payload("{not json}").is_err());
        assert!(parse_expense_payload("").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "餐".repeat(100);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= MAX_RAW_IN_ERROR + 3);
    }
}
