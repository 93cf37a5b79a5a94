//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::RawQuery,
    http::{Request, Response},
    routing::{get, post},
    Json, Router,
};
use ecommerce_api::config::ApiConfig;
use ecommerce_api::db::Database;
use ecommerce_api::http::{ApiError, ApiServer, AppContext, ErrorBody, RequestCookies};
use ecommerce_api::routing::{Collaborator, RouteKey, RouteTable};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Build a server over a disconnected database.
pub fn server(config: ApiConfig, routes: RouteTable) -> ApiServer {
    ApiServer::new(AppContext::new(config, Database::disconnected()), routes)
}

/// Run one request through a fresh copy of the pipeline.
pub async fn send(server: &ApiServer, request: Request<Body>) -> Response<Body> {
    server.router().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn error_message(response: Response<Body>) -> String {
    let body: ErrorBody = serde_json::from_str(&body_text(response).await).unwrap();
    body.message
}

/// A products collaborator that echoes what it receives.
///
/// Every call to `POST /api/products` bumps `hits`.
pub fn products(hits: Arc<AtomicUsize>) -> Collaborator {
    Router::new()
        .route(
            "/",
            get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }).post(
                move |Json(body): Json<Value>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(body)
                },
            ),
        )
        .route("/{id}", get(|| async { "product" }))
        .route("/explode", post(explode))
}

async fn explode() -> &'static str {
    panic!("collaborator blew up")
}

/// An auth collaborator with typed failures and cookie access.
pub fn auth() -> Collaborator {
    Router::new()
        .route(
            "/profile",
            get(|| async { Err::<String, _>(ApiError::unauthorized("Not authorized, no token")) }),
        )
        .route(
            "/crash",
            get(|| async { Err::<String, _>(ApiError::new("Something broke")) }),
        )
        .route(
            "/teapot",
            get(|| async { Err::<String, _>(ApiError::new("Odd status").with_status(299)) }),
        )
        .route(
            "/whoami",
            get(|cookies: RequestCookies| async move {
                cookies.get("jwt").unwrap_or("anonymous").to_string()
            }),
        )
}

pub fn routes(hits: Arc<AtomicUsize>) -> RouteTable {
    RouteTable::new()
        .register(RouteKey::Products, products(hits))
        .register(RouteKey::Auth, auth())
}
