//! Secure E-Commerce API gateway library

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::ApiConfig;
pub use http::{ApiError, ApiServer, AppContext};
pub use lifecycle::Shutdown;
pub use routing::{RouteKey, RouteTable};
