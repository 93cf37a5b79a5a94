//! Secure E-Commerce API gateway
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ request id ─▶ trace ─▶ security headers ─▶ rate limit
//!         ─▶ body limit / JSON ─▶ cookies ─▶ sanitize ─▶ CORS
//!         ─▶ metrics ─▶ error boundary ─▶ router
//!                                          │
//!               ┌──────────────────────────┼───────────────────────┐
//!               ▼                          ▼                       ▼
//!         GET / liveness        /api/<key> collaborator        404 fallback
//!
//!     Cross-cutting: config (file + env), database (background connect),
//!     observability (tracing, metrics), lifecycle (signals, shutdown)
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use ecommerce_api::config;
use ecommerce_api::lifecycle::{bootstrap, Shutdown};
use ecommerce_api::observability::logging;
use ecommerce_api::routing::RouteTable;

#[derive(Parser)]
#[command(name = "ecommerce-api")]
#[command(about = "Secure E-Commerce API gateway", long_about = None)]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init();
    tracing::info!("ecommerce-api v{} starting", env!("CARGO_PKG_VERSION"));

    let config = config::load_effective(args.config.as_deref())
        .context("failed to load configuration")?;

    if args.check {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        origins = config.cors.allowed_origins.len(),
        rate_limit = config.rate_limit.enabled,
        database_configured = config.database.url.is_some(),
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address();
    let server = bootstrap(config, RouteTable::new());

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
