//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics recorder when enabled
//! - Create the database handle and start connecting in the background
//! - Build the shared context and the HTTP server
//!
//! # Design Decisions
//! - Configuration is already validated; nothing here is fatal
//! - The database connects concurrently with serving, never blocking it

use std::net::SocketAddr;

use crate::config::ApiConfig;
use crate::db::Database;
use crate::http::server::{ApiServer, AppContext};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Wire every subsystem and return a server ready to run.
///
/// Must be called inside a Tokio runtime.
pub fn bootstrap(config: ApiConfig, routes: RouteTable) -> ApiServer {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to install metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let database = Database::disconnected();
    database.spawn_connect(config.database.clone());

    for key in routes.registered() {
        tracing::debug!(prefix = %key.prefix(), "Collaborator registered");
    }

    ApiServer::new(AppContext::new(config, database), routes)
}
