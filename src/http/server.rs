//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: liveness, collaborators, not-found fallback
//! - Wire up middleware in its fixed order
//! - Bind server to listener and serve until shutdown
//!
//! # Middleware Order (outermost first)
//! ```text
//! request id → trace → propagate request id
//!     → security headers → rate limit → body limit → cookies → sanitize → CORS
//!     → metrics → error boundary → panic catcher → router
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::db::Database;
use crate::http::cookies::parse_cookies;
use crate::http::error::{error_boundary, panic_response};
use crate::http::fallback::{liveness, not_found};
use crate::http::request::{propagate_request_id, set_request_id};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics::track_requests;
use crate::routing::RouteTable;
use crate::security::{
    cors_layer, headers::security_headers, limits::limit_body, rate_limit::rate_limit,
    sanitize::sanitize_request, BodyLimit, RateLimiter, SecurityHeaders,
};

/// Process-wide state handed to every collaborator.
///
/// Built once at startup and shared by clone.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<ApiConfig>,
    db: Database,
}

impl AppContext {
    pub fn new(config: ApiConfig, db: Database) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// HTTP server for the API.
pub struct ApiServer {
    router: Router,
    context: AppContext,
}

impl ApiServer {
    pub fn new(context: AppContext, routes: RouteTable) -> Self {
        let router = Self::build_router(&context, routes);
        Self { router, context }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(context: &AppContext, routes: RouteTable) -> Router {
        let config = context.config();

        let app = Router::new().route("/", get(liveness).fallback(not_found));
        let app = routes
            .mount(app)
            .fallback(not_found)
            .with_state(context.clone());

        let headers = SecurityHeaders::from_config(&config.security);
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(&config.rate_limit)));

        // Layers wrap everything added before them: last added runs first.
        app.layer(CatchPanicLayer::custom(panic_response))
            .layer(from_fn(error_boundary))
            .layer(from_fn(track_requests))
            .layer(cors_layer(&config.cors))
            .layer(from_fn(sanitize_request))
            .layer(from_fn(parse_cookies))
            .layer(from_fn_with_state(
                BodyLimit(config.security.max_body_bytes),
                limit_body,
            ))
            .layer(from_fn_with_state(limiter, rate_limit))
            .layer(from_fn_with_state(headers, security_headers))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id())
    }

    /// The assembled router, for driving the pipeline without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Serve on `listener` until an OS signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
