//! Cookie parsing.
//!
//! Parses every `Cookie` header once per request into [`RequestCookies`].
//! Malformed pairs are skipped; a request never fails because of its cookies.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// Cookies sent with the request, keyed by name (values percent-decoded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies(BTreeMap<String, String>);

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        Self(
            jar.iter()
                .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Middleware storing [`RequestCookies`] in the request extensions.
pub async fn parse_cookies(mut request: Request, next: Next) -> Response {
    let cookies = RequestCookies::from_headers(request.headers());
    request.extensions_mut().insert(cookies);
    next.run(request).await
}

impl<S> FromRequestParts<S> for RequestCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}
