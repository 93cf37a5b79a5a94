//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → request.rs (request ID)
//!     → cookies.rs (cookie map for collaborators)
//!     → [collaborator under /api/<key>] or fallback.rs (liveness, 404)
//!     → error.rs (uniform {"message"} envelope)
//!     → Send to client
//! ```

pub mod cookies;
pub mod error;
pub mod fallback;
pub mod request;
pub mod server;

pub use cookies::RequestCookies;
pub use error::{ApiError, ErrorBody};
pub use request::X_REQUEST_ID;
pub use server::{ApiServer, AppContext};
