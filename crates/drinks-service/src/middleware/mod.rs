//! Middleware for the drinks service.
//!
//! # Components
//!
//! - `auth` - Bearer token verification and permission gate for mutating routes
//! - `http_metrics` - HTTP request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{extract_bearer_token, require_permission, AuthState};
pub use http_metrics::http_metrics_middleware;
