//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteTable::register(key, collaborator) ×N
//!     → router.rs mounts each key under /api/<key>
//!     → frozen into the Axum router
//!
//! Per request:
//!     path → matched collaborator, `GET /` liveness, or not-found fallback
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Collaborators are opaque; this layer never inspects their responses

pub mod matcher;
pub mod router;

pub use matcher::{RouteKey, API_PREFIX};
pub use router::{Collaborator, RouteTable};
