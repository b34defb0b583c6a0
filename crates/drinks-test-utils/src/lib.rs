//! # Drinks Test Utilities
//!
//! Shared test utilities for the drinks service.
//!
//! This crate provides:
//! - RSA signing fixtures (`TestSigningKey`)
//! - Claim builders (`TestTokenBuilder`)
//! - A mock JWKS endpoint (`MockJwksServer`)
//! - Server test harness (`TestDrinksServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drinks_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let jwks = MockJwksServer::start().await;
//!     let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;
//!
//!     let claims = TestTokenBuilder::new()
//!         .with_permissions(&["get:drinks-detail"])
//!         .build();
//!     let token = jwks.signing_key().sign(&claims)?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/drinks-detail", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod server_harness;
pub mod token_builders;

pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use server_harness::*;
pub use token_builders::*;
