//! Mock JWKS endpoint backed by `wiremock`.

use crate::crypto_fixtures::TestSigningKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves the key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Default `kid` of the published signing key.
pub const TEST_KID: &str = "test-key-01";

/// A running mock identity provider JWKS endpoint.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwksServer::start().await;
/// let token = jwks.signing_key().sign(&claims)?;
/// ```
pub struct MockJwksServer {
    server: MockServer,
    signing_key: TestSigningKey,
}

impl MockJwksServer {
    /// Serve a key set containing the primary fixture key.
    pub async fn start() -> Self {
        let signing_key = TestSigningKey::primary(TEST_KID);
        let body = json!({ "keys": [signing_key.jwk_json()] });
        Self::start_with(signing_key, ResponseTemplate::new(200).set_body_json(body)).await
    }

    /// Serve the given JWK entries. The signing key is still the primary fixture.
    pub async fn with_keys(keys: Vec<Value>) -> Self {
        let body = json!({ "keys": keys });
        Self::start_with(
            TestSigningKey::primary(TEST_KID),
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await
    }

    /// Serve an arbitrary response (error status, non-JSON body, ...).
    pub async fn with_response(response: ResponseTemplate) -> Self {
        Self::start_with(TestSigningKey::primary(TEST_KID), response).await
    }

    async fn start_with(signing_key: TestSigningKey, response: ResponseTemplate) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response)
            .mount(&server)
            .await;

        Self {
            server,
            signing_key,
        }
    }

    /// Full URL of the JWKS document.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Key whose public half is published by `start()`.
    pub fn signing_key(&self) -> &TestSigningKey {
        &self.signing_key
    }

    /// Number of JWKS fetches the mock has served.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
