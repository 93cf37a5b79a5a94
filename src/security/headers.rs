//! Security response headers.
//!
//! # Responsibilities
//! - Attach a fixed hardening policy to every response
//! - Allow cross-origin loading of static assets through
//!   `Cross-Origin-Resource-Policy`
//! - Strip `X-Powered-By`
//!
//! # Design Decisions
//! - Headers are only inserted when absent, so a handler can override one
//! - Never fails; disabled policy is a pass-through

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

const FIXED_HEADERS: [(&str, &str); 11] = [
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-opener-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");

/// Pre-built header policy shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        if !config.enable_headers {
            return Self::default();
        }

        let resource_policy = HeaderValue::from_str(&config.cross_origin_resource_policy)
            .unwrap_or_else(|_| HeaderValue::from_static("cross-origin"));

        let mut headers: Vec<_> = FIXED_HEADERS
            .into_iter()
            .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
            .collect();
        headers.push((CROSS_ORIGIN_RESOURCE_POLICY, resource_policy));

        Self {
            headers: Arc::new(headers),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Insert each policy header that is not already set.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if !self.is_enabled() {
            return;
        }
        for (name, value) in self.headers.iter() {
            headers.entry(name).or_insert_with(|| value.clone());
        }
        headers.remove("x-powered-by");
    }
}

pub async fn security_headers(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_cross_origin_resources() {
        let policy = SecurityHeaders::from_config(&SecurityConfig::default());
        let mut headers = HeaderMap::new();
        policy.apply(&mut headers);

        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers.len(), FIXED_HEADERS.len() + 1);
    }

    #[test]
    fn existing_headers_win_and_powered_by_is_removed() {
        let policy = SecurityHeaders::from_config(&SecurityConfig::default());
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        headers.insert("x-powered-by", HeaderValue::from_static("Express"));
        policy.apply(&mut headers);

        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(!headers.contains_key("x-powered-by"));
    }

    #[test]
    fn disabled_policy_is_pass_through() {
        let config = SecurityConfig {
            enable_headers: false,
            ..SecurityConfig::default()
        };
        let policy = SecurityHeaders::from_config(&config);
        let mut headers = HeaderMap::new();
        policy.apply(&mut headers);

        assert!(!policy.is_enabled());
        assert!(headers.is_empty());
    }

    #[test]
    fn resource_policy_follows_config() {
        let config = SecurityConfig {
            cross_origin_resource_policy: "same-site".into(),
            ..SecurityConfig::default()
        };
        let mut headers = HeaderMap::new();
        SecurityHeaders::from_config(&config).apply(&mut headers);
        assert_eq!(headers["cross-origin-resource-policy"], "same-site");
    }
}
