//! Drinks Service Library
//!
//! A small catalog API for drinks and their recipes. Reads of the summary
//! view are public; the detailed view and all mutations are gated on
//! permissions carried in bearer tokens issued by an external identity
//! provider and verified against its JWKS.
//!
//! # Architecture
//!
//! The service follows the Handler -> Repository pattern:
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS resolution, token verification, and the permission gate
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth and HTTP metrics middleware
//! - `models` - Catalog data models and wire formats
//! - `observability` - Prometheus metrics
//! - `repositories` - Drink store trait and implementations
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
