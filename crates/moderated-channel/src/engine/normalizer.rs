//! Verdict normalizer
//!
//! Model replies are free-form text. The normalizer is lenient about
//! formatting (markdown fences, surrounding prose, whitespace) but strict
//! about shape: the payload must be a JSON object, because downstream code
//! reads named fields from it.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::contracts::{Verdict, DEFAULT_RESPONSE};

/// Normalizer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Verdict is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Verdict must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl NormalizeError {
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizeError::InvalidJson(_) => "invalid_json",
            NormalizeError::NotAnObject(_) => "not_an_object",
        }
    }
}

fn fenced_json() -> &'static Regex {
    static FENCED_JSON: OnceLock<Regex> = OnceLock::new();
    FENCED_JSON
        .get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fenced json regex"))
}

/// Interior of the first ```json fence, or the whole trimmed text
pub fn extract_payload(raw: &str) -> &str {
    match fenced_json().captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

/// Parse a raw model reply into a verdict
pub fn normalize(raw: &str) -> Result<Verdict, NormalizeError> {
    let candidate = extract_payload(raw);

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        tracing::warn!(error = %e, payload = %candidate, "Failed to parse verdict JSON");
        NormalizeError::InvalidJson(e.to_string())
    })?;

    let Value::Object(fields) = value else {
        let found = json_type_name(&value);
        tracing::warn!(found, payload = %candidate, "Verdict payload is not an object");
        return Err(NormalizeError::NotAnObject(found));
    };

    Ok(Verdict {
        allowed: read_allowed(&fields),
        response: read_response(&fields),
    })
}

/// Missing ⇒ allowed; strings are denied only by a case-insensitive "false"
fn read_allowed(fields: &Map<String, Value>) -> bool {
    match fields.get("allowed") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.eq_ignore_ascii_case("false"),
        Some(Value::Null) => false,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn read_response(fields: &Map<String, Value>) -> String {
    match fields.get("response") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => DEFAULT_RESPONSE.to_string(),
        Some(other) => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let verdict = normalize(r#"{"response": "Try brown butter.", "allowed": true}"#).unwrap();
        assert_eq!(verdict, Verdict::allow("Try brown butter."));
    }

    #[test]
    fn test_fenced_block_inside_prose() {
        let raw = "Sure! Here is my answer:\n```json\n{\n  \"response\": \"Off topic.\",\n  \"allowed\": false\n}\n```\nHope that helps.";
        let verdict = normalize(raw).unwrap();
        assert_eq!(verdict, Verdict::deny("Off topic."));
    }

    #[test]
    fn test_first_fence_wins() {
        let raw = "```json {\"response\": \"first\"} ``` and ```json {\"response\": \"second\"} ```";
        assert_eq!(extract_payload(raw), "{\"response\": \"first\"}");
    }

    #[test]
    fn test_unfenced_text_is_trimmed() {
        assert_eq!(extract_payload("  \n{\"a\": 1}\n\t"), "{\"a\": 1}");
    }

    #[test]
    fn test_allowed_string_coercion() {
        for raw in ["false", "False", "FALSE", "fAlSe"] {
            let payload = format!(r#"{{"response": "r", "allowed": "{}"}}"#, raw);
            assert!(!normalize(&payload).unwrap().allowed, "{} should deny", raw);
        }
        for raw in ["true", "no", "0", ""] {
            let payload = format!(r#"{{"response": "r", "allowed": "{}"}}"#, raw);
            assert!(normalize(&payload).unwrap().allowed, "{} should allow", raw);
        }
    }

    #[test]
    fn test_allowed_missing_defaults_true() {
        assert!(normalize(r#"{"response": "r"}"#).unwrap().allowed);
    }

    #[test]
    fn test_allowed_truthiness_of_other_values() {
        assert!(!normalize(r#"{"allowed": null}"#).unwrap().allowed);
        assert!(!normalize(r#"{"allowed": 0}"#).unwrap().allowed);
        assert!(normalize(r#"{"allowed": 1}"#).unwrap().allowed);
        assert!(!normalize(r#"{"allowed": []}"#).unwrap().allowed);
        assert!(normalize(r#"{"allowed": {"x": 1}}"#).unwrap().allowed);
    }

    #[test]
    fn test_response_defaults() {
        assert_eq!(normalize("{}").unwrap().response, DEFAULT_RESPONSE);
        assert_eq!(
            normalize(r#"{"response": null}"#).unwrap().response,
            DEFAULT_RESPONSE
        );
        assert_eq!(normalize(r#"{"response": 42}"#).unwrap().response, "42");
    }

    #[test]
    fn test_rejects_non_objects() {
        assert_eq!(
            normalize("[1, 2, 3]").unwrap_err(),
            NormalizeError::NotAnObject("array")
        );
        assert_eq!(
            normalize("```json\n\"just text\"\n```").unwrap_err(),
            NormalizeError::NotAnObject("string")
        );
        assert_eq!(normalize("42").unwrap_err(), NormalizeError::NotAnObject("number"));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = normalize("I cannot help with that.").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson(_)));
        assert_eq!(err.kind(), "invalid_json");

        // trailing comma
        let err = normalize("{\"response\": \"x\", \"allowed\": true,}").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson(_)));
    }
}
