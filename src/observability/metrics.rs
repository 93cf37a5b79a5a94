//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status, route group
//! - `api_request_duration_seconds` (histogram): latency by method, route group
//! - `api_rate_limited_total` (counter): requests rejected by the rate limiter
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder it is a no-op
//! - Route group labels are bounded to the nine keys plus `root` and
//!   `unmatched`, never raw paths

use std::net::SocketAddr;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::RouteKey;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Bounded label for the route group owning `path`.
pub fn route_group(path: &str) -> &'static str {
    if path == "/" {
        "root"
    } else {
        RouteKey::from_path(path)
            .map(RouteKey::as_str)
            .unwrap_or("unmatched")
    }
}

pub fn record_request(method: &str, status: u16, group: &'static str, start: Instant) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string(),
        "group" => group
    )
    .increment(1);
    metrics::histogram!(
        "api_request_duration_seconds",
        "method" => method.to_owned(),
        "group" => group
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("api_rate_limited_total").increment(1);
}

/// Middleware recording one sample per request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let group = route_group(request.uri().path());

    let response = next.run(request).await;
    record_request(method.as_str(), response.status().as_u16(), group, start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_bounded() {
        assert_eq!(route_group("/"), "root");
        assert_eq!(route_group("/api/orders/17"), "orders");
        assert_eq!(route_group("/api/wallet"), "wallet");
        assert_eq!(route_group("/favicon.ico"), "unmatched");
        assert_eq!(route_group("/api/unknown"), "unmatched");
    }
}
