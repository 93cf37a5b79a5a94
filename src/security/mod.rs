//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (attach security headers to the eventual response)
//!     → rate_limit.rs (per-client budget, when enabled)
//!     → limits.rs (body size, JSON pre-parse)
//!     → sanitize.rs (strip operator keys from body and query)
//!     → cors.rs (origin allow-list, preflight)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Each stage either passes the request on or short-circuits with an `ApiError`
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;
pub mod sanitize;

pub use cors::cors_layer;
pub use headers::SecurityHeaders;
pub use limits::{BodyLimit, JsonBody};
pub use rate_limit::RateLimiter;
pub use sanitize::sanitize_value;
