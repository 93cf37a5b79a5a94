//! Built-in endpoints: the liveness probe and the not-found fallback.

use axum::extract::OriginalUri;

use crate::http::error::ApiError;

/// Plain-text body returned by `GET /`.
pub const LIVENESS_MESSAGE: &str = "Secure E-Commerce API Running...";

/// `GET /`. Touches neither the database nor any collaborator.
pub async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Fallback for requests no route claimed.
///
/// Uses the URI as received, before sanitization rewrote the query.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    ApiError::not_found(format!("Route not found: {target}"))
}
