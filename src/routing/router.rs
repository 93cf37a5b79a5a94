//! Static collaborator registrations.
//!
//! # Responsibilities
//! - Hold at most one collaborator router per [`RouteKey`]
//! - Mount every key under `/api/<key>` in a fixed order
//!
//! # Design Decisions
//! - Immutable once mounted; no registration at runtime
//! - Unregistered keys are still mounted (empty), so their prefix falls
//!   through to the not-found handler like any unknown path
//! - Prefixes are disjoint, so mount order does not affect dispatch

use std::collections::BTreeMap;

use axum::Router;

use crate::http::server::AppContext;
use crate::routing::matcher::RouteKey;

/// Collaborator router type; handlers receive the shared [`AppContext`].
pub type Collaborator = Router<AppContext>;

#[derive(Default)]
pub struct RouteTable {
    entries: BTreeMap<RouteKey, Collaborator>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `router` under `key`, replacing any earlier registration.
    pub fn register(mut self, key: RouteKey, router: Collaborator) -> Self {
        if self.entries.insert(key, router).is_some() {
            tracing::warn!(key = %key, "Collaborator registered twice; keeping the latest");
        }
        self
    }

    pub fn is_registered(&self, key: RouteKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn registered(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.entries.keys().copied()
    }

    /// Nest every key's collaborator into `app`.
    pub fn mount(mut self, app: Router<AppContext>) -> Router<AppContext> {
        RouteKey::ALL.into_iter().fold(app, |app, key| {
            let collaborator = self.entries.remove(&key).unwrap_or_default();
            tracing::debug!(prefix = %key.prefix(), "Mounting collaborator");
            app.nest(&key.prefix(), collaborator)
        })
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("registered", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[test]
    fn later_registration_replaces_earlier() {
        let table = RouteTable::new()
            .register(RouteKey::Cart, Router::new().route("/", get(|| async { "a" })))
            .register(RouteKey::Cart, Router::new().route("/", get(|| async { "b" })))
            .register(RouteKey::Wallet, Router::new());

        assert!(table.is_registered(RouteKey::Cart));
        assert!(table.is_registered(RouteKey::Wallet));
        assert!(!table.is_registered(RouteKey::Auth));
        assert_eq!(
            table.registered().collect::<Vec<_>>(),
            vec![RouteKey::Cart, RouteKey::Wallet]
        );
    }
}
