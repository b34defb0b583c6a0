//! Bearer token authentication and authorization.
//!
//! # Components
//!
//! - `jwks` - Fetches the identity provider's signing keys on demand
//! - `jwt` - Verifies token signature, expiry, audience, and issuer
//! - `claims` - Typed claim set produced by successful verification
//! - `gate` - Checks a required permission against verified claims

pub mod claims;
pub mod gate;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, Claims};
pub use gate::{authorize, Permission};
pub use jwks::{Jwk, JwksClient, KeySet};
pub use jwt::{JwtValidator, ValidationSettings};
