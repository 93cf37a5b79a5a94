//! Route keys and prefix matching.
//!
//! # Design Decisions
//! - The nine keys form a closed enum, so uniqueness is a type property
//! - Prefix matching is segment-aware: `/api/cart` and `/api/cart/items`
//!   match `cart`, `/api/cartoon` does not
//! - Path matching is case-sensitive

use std::fmt;
use std::str::FromStr;

/// Root of every collaborator mount point.
pub const API_PREFIX: &str = "/api";

/// Symbolic key of a collaborator route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteKey {
    Auth,
    Products,
    /// Customer accounts.
    Users,
    Admin,
    Seller,
    Cart,
    Orders,
    Payments,
    Wallet,
}

impl RouteKey {
    pub const ALL: [RouteKey; 9] = [
        RouteKey::Auth,
        RouteKey::Products,
        RouteKey::Users,
        RouteKey::Admin,
        RouteKey::Seller,
        RouteKey::Cart,
        RouteKey::Orders,
        RouteKey::Payments,
        RouteKey::Wallet,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RouteKey::Auth => "auth",
            RouteKey::Products => "products",
            RouteKey::Users => "users",
            RouteKey::Admin => "admin",
            RouteKey::Seller => "seller",
            RouteKey::Cart => "cart",
            RouteKey::Orders => "orders",
            RouteKey::Payments => "payments",
            RouteKey::Wallet => "wallet",
        }
    }

    /// Externally visible mount point, `/api/<key>`.
    pub fn prefix(self) -> String {
        format!("{API_PREFIX}/{}", self.as_str())
    }

    /// The group whose prefix owns `path`, if any.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(API_PREFIX)?.strip_prefix('/')?;
        let segment = rest.split('/').next()?;
        segment.parse().ok()
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a name that is not one of the nine keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route key `{0}`")]
pub struct UnknownRouteKey(pub String);

impl FromStr for RouteKey {
    type Err = UnknownRouteKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownRouteKey(s.to_owned()))
    }
}
