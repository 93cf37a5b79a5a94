//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, limits, pool sizes)
//! - Reject CORS policies the browser would refuse or that leak credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApiConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::ApiConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

const RESOURCE_POLICIES: [&str; 3] = ["same-origin", "same-site", "cross-origin"];

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "must be non-zero"));
    }

    let cors = &config.cors;
    if cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new(
            "cors.allowed_origins",
            "at least one origin is required",
        ));
    }
    for origin in &cors.allowed_origins {
        if origin == "*" && cors.allow_credentials {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                "wildcard origin cannot be combined with credentials",
            ));
        } else if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("`{origin}` is not a valid header value"),
            ));
        }
    }
    for method in &cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("`{method}` is not an HTTP method"),
            ));
        }
    }
    for header in &cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("`{header}` is not a valid header name"),
            ));
        }
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "security.max_body_bytes",
            "must be non-zero",
        ));
    }
    if !RESOURCE_POLICIES.contains(&config.security.cross_origin_resource_policy.as_str()) {
        errors.push(ValidationError::new(
            "security.cross_origin_resource_policy",
            format!("expected one of {}", RESOURCE_POLICIES.join(", ")),
        ));
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled && (rate_limit.requests_per_second == 0 || rate_limit.burst_size == 0) {
        errors.push(ValidationError::new(
            "rate_limit",
            "requests_per_second and burst_size must be non-zero when enabled",
        ));
    }

    let database = &config.database;
    if database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be non-zero",
        ));
    }
    if database.min_connections > database.max_connections {
        errors.push(ValidationError::new(
            "database.min_connections",
            "cannot exceed max_connections",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ApiConfig::default()), Ok(()));
    }

    #[test]
    fn wildcard_origin_with_credentials_is_rejected() {
        let mut config = ApiConfig::default();
        config.cors.allowed_origins.insert("*".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cors.allowed_origins");
    }

    #[test]
    fn reports_every_failure() {
        let mut config = ApiConfig::default();
        config.listener.port = 0;
        config.cors.allowed_origins.clear();
        config.cors.allowed_headers.push("bad header".into());
        config.security.max_body_bytes = 0;
        config.security.cross_origin_resource_policy = "anywhere".into();
        config.database.min_connections = 50;

        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();

        assert_eq!(
            fields,
            vec![
                "listener.port",
                "cors.allowed_origins",
                "cors.allowed_headers",
                "security.max_body_bytes",
                "security.cross_origin_resource_policy",
                "database.min_connections",
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ApiConfig::default();
        config.observability.metrics_address = "not an address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn enabled_rate_limit_needs_capacity() {
        let mut config = ApiConfig::default();
        config.rate_limit.enabled = true;
        config.rate_limit.burst_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "rate_limit");
    }
}
