//! JWKS client for fetching the identity provider's public signing keys.
//!
//! Keys are fetched from `/.well-known/jwks.json` on every call. There is no
//! cache: each verification resolves its own copy of the key set, so no key
//! material is shared between requests.

use crate::errors::AuthError;
use crate::observability::metrics;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Timeout for a single JWKS fetch.
const JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for RS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm the key is intended for.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use ("sig" for signing keys).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,
}

/// Signing keys indexed by key ID.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Jwk>,
}

impl KeySet {
    /// Build a key set from a parsed JWKS document.
    ///
    /// Entries that are not objects with `kty` and `kid` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetMalformed` if the document has no `keys` list.
    pub fn from_jwks_json(document: &Value) -> Result<Self, AuthError> {
        let entries = document
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                tracing::error!(target: "drinks.auth.jwks", "JWKS document has no keys list");
                AuthError::KeySetMalformed
            })?;

        let mut keys = HashMap::with_capacity(entries.len());
        for entry in entries {
            match Jwk::deserialize(entry) {
                Ok(jwk) => {
                    keys.insert(jwk.kid.clone(), jwk);
                }
                Err(e) => {
                    tracing::warn!(target: "drinks.auth.jwks", error = %e, "Skipping unusable JWKS entry");
                }
            }
        }

        Ok(Self { keys })
    }

    /// Look up a key by ID.
    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<Jwk> for KeySet {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(|key| (key.kid.clone(), key)).collect(),
        }
    }
}

/// JWKS client for fetching public keys.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the identity provider's JWKS endpoint
    pub fn new(jwks_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(JWKS_FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "drinks.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch and parse the current key set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if the fetch fails, the endpoint
    /// returns a non-success status, or the body is not JSON.
    /// Returns `AuthError::KeySetMalformed` if the body has no `keys` list.
    #[instrument(skip(self), name = "drinks.auth.jwks.fetch")]
    pub async fn fetch_key_set(&self) -> Result<KeySet, AuthError> {
        let start = Instant::now();
        let result = self.fetch_inner().await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AuthError::KeySetMalformed) => "malformed",
            Err(_) => "unavailable",
        };
        metrics::record_jwks_fetch(outcome, start.elapsed());

        result
    }

    async fn fetch_inner(&self) -> Result<KeySet, AuthError> {
        tracing::debug!(target: "drinks.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "drinks.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeySetUnavailable);
        }

        let document: Value = response.json().await.map_err(|e| {
            tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeySetUnavailable
        })?;

        let key_set = KeySet::from_jwks_json(&document)?;

        tracing::debug!(
            target: "drinks.auth.jwks",
            key_count = key_set.len(),
            "JWKS fetched"
        );

        Ok(key_set)
    }
}
