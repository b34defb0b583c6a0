//! JWT verification.
//!
//! Verifies bearer tokens against public keys fetched from the identity
//! provider's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only the configured RSA algorithms are accepted
//! - `exp`, `aud`, and `iss` are required and validated
//! - Each failure maps to exactly one `AuthError` kind

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient, KeySet};
use crate::config::Config;
use crate::errors::AuthError;
use crate::observability::metrics;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected before any base64 decoding or
/// signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Expected claim values and accepted algorithms.
#[derive(Debug, Clone)]
pub struct ValidationSettings {
    /// Required `aud` value.
    pub audience: String,

    /// Required `iss` value (`https://<domain>/`).
    pub issuer: String,

    /// Accepted signing algorithms (RSA family).
    pub algorithms: Vec<Algorithm>,

    /// Leeway in seconds for `exp`.
    pub leeway_seconds: u64,
}

impl ValidationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            audience: config.api_audience.clone(),
            issuer: config.issuer(),
            algorithms: config.algorithms.clone(),
            leeway_seconds: config.jwt_leeway_seconds,
        }
    }
}

/// JWT validator using keys from the identity provider's JWKS.
pub struct JwtValidator {
    /// JWKS client for fetching public keys.
    jwks_client: Arc<JwksClient>,

    settings: ValidationSettings,
}

impl JwtValidator {
    /// Create a new JWT validator.
    pub fn new(jwks_client: Arc<JwksClient>, settings: ValidationSettings) -> Self {
        Self {
            jwks_client,
            settings,
        }
    }

    /// Fetch the current key set and verify `token` against it.
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` kind of the first failing check, including
    /// `KeySetUnavailable` / `KeySetMalformed` from the key fetch.
    #[instrument(skip_all, name = "drinks.auth.validate")]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let result = match self.jwks_client.fetch_key_set().await {
            Ok(key_set) => self.verify(token, &key_set),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code(),
        };
        metrics::record_token_validation(outcome);

        result
    }

    /// Verify `token` against an already resolved key set.
    ///
    /// # Security Checks
    ///
    /// 1. Size check and `kid` extraction from the unverified header
    /// 2. Key lookup by `kid`
    /// 3. Header algorithm against the accepted list
    /// 4. Signature verification with the key's RSA components
    /// 5. `exp` strictly in the future (with configured leeway)
    /// 6. `aud` contains the configured audience
    /// 7. `iss` equals the configured issuer
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - oversized token, unparseable header, missing `kid`,
    ///   or a header algorithm outside the accepted list
    /// - `UnknownSigningKey` - no usable key with that `kid`
    /// - `KeySetMalformed` - matching key lacks valid RSA components
    /// - `InvalidSignature` - signature does not verify
    /// - `TokenExpired` - `exp` is in the past
    /// - `InvalidClaims` - audience/issuer mismatch or missing required claims
    pub fn verify(&self, token: &str, key_set: &KeySet) -> Result<Claims, AuthError> {
        let kid = extract_kid(token)?;

        // An unknown kid is reported as such whatever else is wrong with the header
        let jwk = key_set.get(&kid).ok_or_else(|| {
            tracing::debug!(target: "drinks.auth.jwt", kid = %kid, "Key not found in JWKS");
            AuthError::UnknownSigningKey
        })?;

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "drinks.auth.jwt", error = %e, "Unsupported JWT header");
            AuthError::MalformedHeader
        })?;
        if !self.settings.algorithms.contains(&header.alg) {
            tracing::debug!(target: "drinks.auth.jwt", alg = ?header.alg, "Token algorithm not accepted");
            return Err(AuthError::MalformedHeader);
        }

        let decoding_key = self.decoding_key(jwk)?;
        let validation = self.validation()?;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            let kind = classify(&e);
            tracing::debug!(target: "drinks.auth.jwt", error = %e, code = kind.code(), "Token verification failed");
            kind
        })?;

        tracing::debug!(target: "drinks.auth.jwt", kid = %kid, "Token validated successfully");
        Ok(token_data.claims)
    }

    /// Build an RSA decoding key from a JWK.
    fn decoding_key(&self, jwk: &Jwk) -> Result<DecodingKey, AuthError> {
        if let Some(key_use) = &jwk.key_use {
            if key_use != "sig" {
                tracing::warn!(target: "drinks.auth.jwt", kid = %jwk.kid, key_use = %key_use, "JWK is not a signing key");
                return Err(AuthError::UnknownSigningKey);
            }
        }

        if let Some(alg) = &jwk.alg {
            let accepted = Algorithm::from_str(alg)
                .map(|parsed| self.settings.algorithms.contains(&parsed))
                .unwrap_or(false);
            if !accepted {
                tracing::warn!(target: "drinks.auth.jwt", kid = %jwk.kid, alg = %alg, "JWK algorithm not accepted");
                return Err(AuthError::UnknownSigningKey);
            }
        }

        if jwk.kty != "RSA" {
            tracing::warn!(target: "drinks.auth.jwt", kid = %jwk.kid, kty = %jwk.kty, "Unexpected JWK key type");
            return Err(AuthError::KeySetMalformed);
        }

        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            tracing::error!(target: "drinks.auth.jwt", kid = %jwk.kid, "JWK missing RSA components");
            return Err(AuthError::KeySetMalformed);
        };

        DecodingKey::from_rsa_components(n, e).map_err(|err| {
            tracing::error!(target: "drinks.auth.jwt", kid = %jwk.kid, error = %err, "Invalid RSA key components");
            AuthError::KeySetMalformed
        })
    }

    fn validation(&self) -> Result<Validation, AuthError> {
        let first = self.settings.algorithms.first().copied().ok_or_else(|| {
            tracing::error!(target: "drinks.auth.jwt", "No signing algorithms configured");
            AuthError::MalformedHeader
        })?;

        let mut validation = Validation::new(first);
        validation.algorithms = self.settings.algorithms.clone();
        validation.leeway = self.settings.leeway_seconds;
        validation.validate_exp = true;
        // `exp == now` counts as expired
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.set_audience(&[self.settings.audience.as_str()]);
        validation.set_issuer(&[self.settings.issuer.as_str()]);

        Ok(validation)
    }
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Errors
///
/// Returns `AuthError::MalformedHeader` if the token is oversized, is not
/// three dot-separated parts, has an undecodable header, or has no
/// non-empty string `kid`.
pub fn extract_kid(token: &str) -> Result<String, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "drinks.auth.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::MalformedHeader);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "drinks.auth.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(AuthError::MalformedHeader);
    }

    let header_part = parts.first().ok_or(AuthError::MalformedHeader)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "drinks.auth.jwt", error = %e, "Failed to decode JWT header base64");
        AuthError::MalformedHeader
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "drinks.auth.jwt", error = %e, "Failed to parse JWT header JSON");
        AuthError::MalformedHeader
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(AuthError::MalformedHeader)
}

/// Map a `jsonwebtoken` failure onto the error taxonomy.
fn classify(err: &JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::InvalidClaims,
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) | ErrorKind::Crypto(_) => {
            AuthError::InvalidSignature
        }
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => AuthError::KeySetMalformed,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => AuthError::MalformedHeader,
        _ => AuthError::InvalidSignature,
    }
}
