//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size (413 Payload Too Large)
//! - Buffer the body once and pre-parse JSON payloads
//! - Reject malformed JSON (400) before any route runs
//!
//! # Design Decisions
//! - `Content-Length` checked before reading (early rejection)
//! - Streaming bodies are cut off at the limit while reading
//! - The limit applies to every body, not only JSON ones

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::http::error::ApiError;

/// Maximum accepted body size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// JSON payload parsed by [`limit_body`], kept in the request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

pub async fn limit_body(
    State(BodyLimit(max)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if declared_length(request.headers()).is_some_and(|len| len > max) {
        return Err(ApiError::payload_too_large());
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, max).await.map_err(|err| {
        if is_length_limit(&err) {
            ApiError::payload_too_large()
        } else {
            tracing::debug!(error = %err, "Failed to read request body");
            ApiError::bad_request("Failed to read request body")
        }
    })?;

    if !bytes.is_empty() && is_json(&parts.headers) {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::bad_request(format!("Malformed JSON body: {err}")))?;
        parts.extensions.insert(JsonBody(value));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn is_length_limit(err: &axum::Error) -> bool {
    std::error::Error::source(err).is_some_and(|source| source.is::<LengthLimitError>())
}

/// `application/json` or any `+json` media type.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}
