//! Centralized error formatting.
//!
//! Every failure path (middleware rejections, unmatched routes, collaborator
//! errors, panics) ends up as an [`ApiError`] rendered as
//! `{"message": ...}` with the carried status, or `500`.

use std::any::Any;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when an error carries none.
pub const DEFAULT_ERROR_MESSAGE: &str = "Internal Server Error";

/// Largest error body the boundary will read back when rewriting a response.
const REWRITE_BODY_LIMIT: usize = 64 * 1024;

/// The single error representation crossing the pipeline boundary.
///
/// `status` is kept raw so that collaborators can hand over whatever code
/// they computed; [`ApiError::status_code`] decides what is actually sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", message_or_default(.message))]
pub struct ApiError {
    message: Option<String>,
    status: Option<u16>,
}

fn message_or_default(message: &Option<String>) -> &str {
    message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Marker placed on responses rendered by [`ApiError`], so the boundary does
/// not format them twice.
#[derive(Debug, Clone, Copy)]
struct Formatted;

impl ApiError {
    /// An error with a message and no status (rendered as 500).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            status: None,
        }
    }

    /// An error with neither message nor status.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a raw status code. Out-of-range codes are kept but rendered as 500.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(message).with_status(status.as_u16())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::FORBIDDEN, message)
    }

    pub fn payload_too_large() -> Self {
        Self::from_status(StatusCode::PAYLOAD_TOO_LARGE, "request entity too large")
    }

    pub fn too_many_requests() -> Self {
        Self::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later.",
        )
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Message sent to the client.
    pub fn message(&self) -> &str {
        message_or_default(&self.message)
    }

    /// Status as provided, before validation.
    pub fn raw_status(&self) -> Option<u16> {
        self.status
    }

    /// Status sent to the client: the carried code when it is an error
    /// status (400-599), otherwise 500.
    pub fn status_code(&self) -> StatusCode {
        self.status
            .filter(|code| (400..=599).contains(code))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Database error");
        Self::internal(DEFAULT_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message().to_owned();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Error: {message}");
        } else {
            tracing::warn!(status = status.as_u16(), "Error: {message}");
        }

        let mut response = (status, Json(ErrorBody { message })).into_response();
        response.extensions_mut().insert(Formatted);
        response
    }
}

/// Rewrites error responses that bypassed [`ApiError`] (extractor
/// rejections, method mismatches, plain-text collaborator errors) into the
/// JSON envelope, keeping their status and headers.
///
/// Only empty or `text/plain` bodies are rewritten. Any other body, JSON
/// included, is a deliberate response and passes through unread.
pub async fn error_boundary(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<Formatted>().is_some()
        || !is_rewritable(response.headers())
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = to_bytes(body, REWRITE_BODY_LIMIT)
        .await
        .ok()
        .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_owned()
        });

    let mut rewritten = ApiError::from_status(status, message).into_response();
    for (name, value) in &parts.headers {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().append(name.clone(), value.clone());
        }
    }
    rewritten
}

/// Empty or short plain-text bodies, the shape of framework rejections.
fn is_rewritable(headers: &HeaderMap) -> bool {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<usize>().ok());
    if declared.is_some_and(|len| len > REWRITE_BODY_LIMIT) {
        return false;
    }

    match headers.get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/plain")),
    }
}

/// Converts a caught panic into a 500 envelope.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Handler panicked");

    ApiError::empty().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn missing_status_resolves_to_500() {
        assert_eq!(
            ApiError::new("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_statuses_resolve_to_500() {
        for code in [0, 99, 200, 302, 600, 1000] {
            let err = ApiError::new("odd").with_status(code);
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{code}");
            assert_eq!(err.raw_status(), Some(code));
        }
    }

    #[test]
    fn valid_error_status_is_kept() {
        assert_eq!(
            ApiError::new("nope").with_status(401).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::new("teapot").with_status(418).status_code(),
            StatusCode::IM_A_TEAPOT
        );
    }

    #[test]
    fn empty_message_is_substituted() {
        assert_eq!(ApiError::empty().message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(ApiError::new("   ").message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(ApiError::empty().to_string(), DEFAULT_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn renders_message_envelope() {
        let response = ApiError::forbidden("Seller access only").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_of(response).await.message, "Seller access only");
    }

    #[tokio::test]
    async fn boundary_rewrites_plain_text_errors() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        [(header::WWW_AUTHENTICATE, "Bearer")],
                        "token expired",
                    )
                }),
            )
            .layer(from_fn(error_boundary));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(body_of(response).await.message, "token expired");
    }

    #[tokio::test]
    async fn boundary_uses_reason_for_empty_bodies() {
        let app = Router::new()
            .route("/", get(|| async { StatusCode::CONFLICT }))
            .layer(from_fn(error_boundary));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_of(response).await.message, "Conflict");
    }

    #[tokio::test]
    async fn boundary_passes_json_errors_through() {
        let raw = r#"{"error":"out of stock","sku":"A1"}"#;
        let app = Router::new()
            .route(
                "/",
                get(move || async move {
                    (
                        StatusCode::CONFLICT,
                        [(header::CONTENT_TYPE, "application/json")],
                        raw,
                    )
                }),
            )
            .layer(from_fn(error_boundary));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], raw.as_bytes());
    }

    #[test]
    fn only_empty_or_plain_text_is_rewritable() {
        let mut headers = HeaderMap::new();
        assert!(is_rewritable(&headers));

        headers.insert(header::CONTENT_TYPE, "text/plain; charset=utf-8".parse().unwrap());
        assert!(is_rewritable(&headers));

        headers.insert(header::CONTENT_LENGTH, (REWRITE_BODY_LIMIT + 1).into());
        assert!(!is_rewritable(&headers));

        headers.remove(header::CONTENT_LENGTH);
        for mime in ["application/json", "application/problem+json", "text/html"] {
            headers.insert(header::CONTENT_TYPE, mime.parse().unwrap());
            assert!(!is_rewritable(&headers), "{mime}");
        }
    }

    #[tokio::test]
    async fn boundary_leaves_success_untouched() {
        let app = Router::new()
            .route("/", get(|| async { "fine" }))
            .layer(from_fn(error_boundary));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let response = panic_response(Box::new("kaboom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.message, DEFAULT_ERROR_MESSAGE);
    }
}
