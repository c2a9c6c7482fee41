//! Declarative request validation.
//!
//! Each route declares a rule table; every rule is evaluated (no
//! short-circuit) so a caller sees all problems in one response. On success
//! the body is mutated in place: string fields are trimmed and unknown
//! fields are rejected rather than silently dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
}

/// One row of a rule table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub min_len: usize,
    pub max_len: usize,
    pub kind: FieldKind,
}

pub const BOOK_RULES: &[FieldRule] = &[
    FieldRule { name: "title", label: "Title", required: true, min_len: 1, max_len: 255, kind: FieldKind::Text },
    FieldRule { name: "author", label: "Author", required: true, min_len: 1, max_len: 255, kind: FieldKind::Text },
];

pub const BOOK_UPDATE_RULES: &[FieldRule] = &[
    FieldRule { name: "title", label: "Title", required: false, min_len: 1, max_len: 255, kind: FieldKind::Text },
    FieldRule { name: "author", label: "Author", required: false, min_len: 1, max_len: 255, kind: FieldKind::Text },
];

pub const CREDENTIAL_RULES: &[FieldRule] = &[
    FieldRule { name: "email", label: "Email", required: true, min_len: 1, max_len: 255, kind: FieldKind::Email },
    FieldRule { name: "password", label: "Password", required: true, min_len: 6, max_len: 128, kind: FieldKind::Text },
];

/// Validate `body` against a rule table, collecting every violation.
///
/// On success the body object is trimmed in place. On failure the aggregated
/// message carries one entry per violation, in rule-declaration order,
/// followed by any unknown-field rejections.
pub fn validate_body(body: &mut Value, rules: &[FieldRule]) -> Result<(), ApiError> {
    let map = match body.as_object_mut() {
        Some(map) => map,
        None => return Err(ApiError::invalid_json("Request body must be a JSON object")),
    };

    let mut errors: Vec<String> = Vec::new();

    for rule in rules {
        match map.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(format!("{} is required", rule.label));
                }
            }
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    // Empty after trim is distinct from missing
                    errors.push(format!("{} cannot be empty", rule.label));
                } else if trimmed.chars().count() > rule.max_len {
                    errors.push(format!("{} cannot exceed {} characters", rule.label, rule.max_len));
                } else if rule.min_len > 1 && trimmed.chars().count() < rule.min_len {
                    errors.push(format!(
                        "{} must be at least {} characters long",
                        rule.label, rule.min_len
                    ));
                } else if rule.kind == FieldKind::Email && !EMAIL_RE.is_match(trimmed) {
                    errors.push("Please provide a valid email address".to_string());
                }
            }
            Some(_) => {
                errors.push(format!("{} must be a string", rule.label));
            }
        }
    }

    for key in map.keys() {
        if !rules.iter().any(|r| r.name == key) {
            errors.push(format!("Unknown field: {}", key));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::validation_error(format!(
            "Validation Error: {}",
            errors.join(", ")
        )));
    }

    // All checks passed: normalize string fields in place
    for rule in rules {
        if let Some(Value::String(raw)) = map.get_mut(rule.name) {
            *raw = raw.trim().to_string();
        }
    }

    Ok(())
}

/// Validate and coerce a path identifier. Distinct messages per failure kind.
pub fn validate_id(raw: &str) -> Result<i64, ApiError> {
    let trimmed = raw.trim();

    if let Ok(id) = trimmed.parse::<i64>() {
        if id <= 0 {
            return Err(ApiError::validation_error(
                "Validation Error: ID must be a positive number",
            ));
        }
        return Ok(id);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            if f <= 0.0 {
                return Err(ApiError::validation_error(
                    "Validation Error: ID must be a positive number",
                ));
            }
            return Err(ApiError::validation_error(
                "Validation Error: ID must be an integer",
            ));
        }
    }

    Err(ApiError::validation_error(
        "Validation Error: ID must be a number",
    ))
}

/// Field accessor for a validated body: the string was already trimmed.
pub fn string_field(body: &Value, name: &str) -> Option<String> {
    body.get(name).and_then(Value::as_str).map(str::to_string)
}
