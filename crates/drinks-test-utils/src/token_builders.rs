//! Builder patterns for test token claims.
//!
//! Defaults produce claims that a `TestDrinksServer` accepts: the test
//! issuer and audience, a one hour lifetime, and no permissions.

use crate::server_harness::{TEST_AUDIENCE, TEST_DOMAIN};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for test JWT claims.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("auth0|barista")
///     .with_permissions(&["get:drinks-detail", "post:drinks"])
///     .expires_in(3600)
///     .build();
/// let token = key.sign(&claims)?;
/// ```
pub struct TestTokenBuilder {
    iss: Option<String>,
    sub: String,
    aud: Option<Value>,
    exp: Option<i64>,
    iat: i64,
    permissions: Option<Vec<String>>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iss: Some(format!("https://{}/", TEST_DOMAIN)),
            sub: "auth0|test-subject".to_string(),
            aud: Some(json!(TEST_AUDIENCE)),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: now.timestamp(),
            permissions: None,
            extra: Map::new(),
        }
    }

    /// Set the subject.
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the permission list.
    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Remove the `permissions` claim entirely.
    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    /// Set a single audience.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(json!(audience));
        self
    }

    /// Set a list of audiences.
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Remove the `aud` claim.
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Remove the `iss` claim.
    pub fn without_issuer(mut self) -> Self {
        self.iss = None;
        self
    }

    /// Set expiration in seconds from now (negative for an expired token).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Remove the `exp` claim.
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Add an arbitrary claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value.
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(iss) = self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        if let Some(aud) = self.aud {
            claims.insert("aud".to_string(), aud);
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(permissions) = self.permissions {
            claims.insert("permissions".to_string(), json!(permissions));
        }
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
