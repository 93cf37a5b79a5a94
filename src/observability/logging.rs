//! Structured logging.
//!
//! # Responsibilities
//! - Load `.env` into the process environment
//! - Initialize the tracing subscriber
//!
//! # Design Decisions
//! - Runs before configuration is loaded so loader warnings are captured
//! - `RUST_LOG` wins, then `LOG_LEVEL`, then [`DEFAULT_DIRECTIVES`]

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DIRECTIVES: &str = "ecommerce_api=info,tower_http=info";

/// Load `.env` and install the global subscriber.
pub fn init() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(env_filter(
            std::env::var("RUST_LOG").ok(),
            std::env::var("LOG_LEVEL").ok(),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

fn env_filter(rust_log: Option<String>, log_level: Option<String>) -> EnvFilter {
    [rust_log, log_level]
        .into_iter()
        .flatten()
        .filter(|directives| !directives.trim().is_empty())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
