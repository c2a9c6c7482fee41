//! Request sanitization.
//!
//! Runs before routing logic: every string leaf in the JSON body and the
//! query string is stripped of markup and trimmed. Sanitization is total;
//! the worst case for a field is the empty string.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, uri::Uri, HeaderMap},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config;
use crate::error::ApiError;

// <script> blocks disappear with their content; any other tag is dropped
// but its text content survives.
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("script regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// Strip markup from a single string and trim surrounding whitespace.
pub fn sanitize_string(input: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(input, "");
    let without_tags = TAG_RE.replace_all(&without_scripts, "");
    without_tags.trim().to_string()
}

/// Recursively sanitize every string leaf of a JSON value.
/// Non-string leaves pass through unchanged.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = sanitize_string(s),
        Value::Array(items) => {
            for item in items {
                sanitize_value(item);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                sanitize_value(v);
            }
        }
        _ => {}
    }
}

fn sanitize_query(query: &str) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        serializer.append_pair(&key, &sanitize_string(&value));
    }
    serializer.finish()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Middleware that rewrites the request with sanitized body and query
/// before any handler runs.
pub async fn sanitize_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let rewritten_path_and_query = parts.uri.query().and_then(|query| {
        let sanitized = sanitize_query(query);
        if sanitized == query {
            return None;
        }
        let path = parts.uri.path();
        Some(if sanitized.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, sanitized)
        })
    });
    if let Some(path_and_query) = rewritten_path_and_query {
        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.path_and_query = Some(
            path_and_query
                .parse()
                .map_err(|_| ApiError::invalid_json("Invalid query string"))?,
        );
        parts.uri = Uri::from_parts(uri_parts)
            .map_err(|_| ApiError::invalid_json("Invalid query string"))?;
    }

    let limit = config::config().api.max_request_size_bytes;
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::invalid_json("Request body too large"))?;

    let bytes = if is_json(&parts.headers) && !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(mut value) => {
                sanitize_value(&mut value);
                let rewritten = serde_json::to_vec(&value)
                    .map_err(|_| ApiError::internal_server_error("Failed to rewrite request body"))?;
                parts.headers.insert(CONTENT_LENGTH, rewritten.len().into());
                rewritten.into()
            }
            // Malformed JSON passes through; the extractor reports it
            Err(_) => bytes,
        }
    } else {
        bytes
    };

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
