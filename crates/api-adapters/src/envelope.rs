//! The JSON wrapper every response travels in, success or error.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status: Outcome,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn success(status_code: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: Outcome::Success,
            status_code,
            message: message.into(),
            data,
            errors: Vec::new(),
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl Envelope<()> {
    pub fn error(status_code: u16, message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            status: Outcome::Error,
            status_code,
            message: message.into(),
            data: None,
            errors,
            request_id: None,
            timestamp: Utc::now(),
        }
    }
}

/// Rust field names to the camelCase used on the wire.
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn empty_parts_are_omitted() {
        let env: Envelope<()> = Envelope::success(200, "ok", None);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["statusCode"], 200);
        assert!(v.get("data").is_none());
        assert!(v.get("errors").is_none());
        assert!(v.get("requestId").is_none());
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn errors_carry_fields_and_request_id() {
        let env = Envelope::error(400, "validation failed", vec![FieldError::new("email", "invalid")])
            .with_request_id(Some("req-1".into()));
        let v: Value = serde_json::to_value(&env).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["errors"], json!([{"field": "email", "message": "invalid"}]));
        assert_eq!(v["requestId"], "req-1");
    }

    #[test]
    fn camel_cases_snake_fields() {
        assert_eq!(camel_case("display_name"), "displayName");
        assert_eq!(camel_case("progress_seconds"), "progressSeconds");
        assert_eq!(camel_case("email"), "email");
    }
}
