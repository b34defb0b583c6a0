//! Token verification integration tests.
//!
//! Drives `JwtValidator` against a mocked JWKS endpoint with real RS256
//! signatures.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use drinks_service::auth::{authorize, JwksClient, JwtValidator, Permission, ValidationSettings};
use drinks_service::errors::AuthError;
use drinks_test_utils::{
    MockJwksServer, TestSigningKey, TestTokenBuilder, TEST_AUDIENCE, TEST_DOMAIN, TEST_KID,
};
use jsonwebtoken::{Algorithm, Header};
use serde_json::json;
use std::sync::Arc;
use wiremock::ResponseTemplate;

fn validator_for(jwks: &MockJwksServer) -> JwtValidator {
    validator_with_leeway(jwks, 0)
}

fn validator_with_leeway(jwks: &MockJwksServer, leeway_seconds: u64) -> JwtValidator {
    JwtValidator::new(
        Arc::new(JwksClient::new(jwks.jwks_url())),
        ValidationSettings {
            audience: TEST_AUDIENCE.to_string(),
            issuer: format!("https://{}/", TEST_DOMAIN),
            algorithms: vec![Algorithm::RS256],
            leeway_seconds,
        },
    )
}

// ============================================================================
// Successful verification
// ============================================================================

#[tokio::test]
async fn test_valid_token_returns_full_payload() {
    let jwks = MockJwksServer::start().await;
    let payload = TestTokenBuilder::new()
        .for_user("auth0|barista")
        .with_permissions(&["get:drinks-detail"])
        .with_claim("azp", json!("frontend-client"))
        .with_claim("scope", json!("openid profile"))
        .build();
    let token = jwks.signing_key().sign(&payload).unwrap();

    let claims = validator_for(&jwks).validate(&token).await.unwrap();

    assert_eq!(serde_json::to_value(&claims).unwrap(), payload);
}

#[tokio::test]
async fn test_audience_list_containing_ours_is_accepted() {
    let jwks = MockJwksServer::start().await;
    let payload = TestTokenBuilder::new()
        .with_audiences(&[TEST_AUDIENCE, "https://drinks-test.us.auth0.com/userinfo"])
        .build();
    let token = jwks.signing_key().sign(&payload).unwrap();

    let claims = validator_for(&jwks).validate(&token).await.unwrap();

    assert!(claims.aud.contains(TEST_AUDIENCE));
}

#[tokio::test]
async fn test_key_set_is_fetched_per_verification() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().build())
        .unwrap();
    let validator = validator_for(&jwks);

    validator.validate(&token).await.unwrap();
    validator.validate(&token).await.unwrap();

    assert_eq!(jwks.fetch_count().await, 2);
}

#[tokio::test]
async fn test_rotated_key_is_found_among_several() {
    let old_key = TestSigningKey::secondary("old-key");
    let current = TestSigningKey::primary("current-key");
    let jwks = MockJwksServer::with_keys(vec![old_key.jwk_json(), current.jwk_json()]).await;
    let token = current.sign(&TestTokenBuilder::new().build()).unwrap();

    assert!(validator_for(&jwks).validate(&token).await.is_ok());
}

// ============================================================================
// Header and key resolution failures
// ============================================================================

#[tokio::test]
async fn test_unknown_kid_is_unknown_signing_key() {
    let jwks = MockJwksServer::start().await;
    let claims = TestTokenBuilder::new().build();

    // Same key material and a foreign key, both under kids the JWKS lacks
    for key in [
        jwks.signing_key().with_kid("not-published"),
        TestSigningKey::secondary("also-not-published"),
    ] {
        let token = key.sign(&claims).unwrap();
        assert_eq!(
            validator_for(&jwks).validate(&token).await.unwrap_err(),
            AuthError::UnknownSigningKey
        );
    }
}

#[tokio::test]
async fn test_unknown_kid_wins_over_expiry() {
    let jwks = MockJwksServer::start().await;
    let token = TestSigningKey::primary("not-published")
        .sign(&TestTokenBuilder::new().expires_in(-3600).build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::UnknownSigningKey
    );
}

#[tokio::test]
async fn test_unknown_kid_wins_over_unaccepted_algorithm() {
    let jwks = MockJwksServer::start().await;
    let claims = TestTokenBuilder::new().build();

    let key = TestSigningKey::primary("not-published");
    let rs384 = key
        .sign_with_header(&claims, key.header(Algorithm::RS384))
        .unwrap();

    let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","kid":"not-published"}"#);
    let unsigned = format!("{}.{}.", none_header, URL_SAFE_NO_PAD.encode(claims.to_string()));

    for token in [rs384, unsigned] {
        assert_eq!(
            validator_for(&jwks).validate(&token).await.unwrap_err(),
            AuthError::UnknownSigningKey
        );
    }
}

#[tokio::test]
async fn test_missing_kid_is_malformed_header() {
    let jwks = MockJwksServer::start().await;
    let header = Header::new(Algorithm::RS256);
    let token = jwks
        .signing_key()
        .sign_with_header(&TestTokenBuilder::new().build(), header)
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::MalformedHeader
    );
}

#[tokio::test]
async fn test_garbage_token_is_malformed_header() {
    let jwks = MockJwksServer::start().await;

    assert_eq!(
        validator_for(&jwks).validate("not-a-jwt").await.unwrap_err(),
        AuthError::MalformedHeader
    );
}

#[tokio::test]
async fn test_unaccepted_algorithm_is_malformed_header() {
    let jwks = MockJwksServer::start().await;

    for alg in ["HS256", "none"] {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{}","kid":"{}"}}"#, alg, TEST_KID));
        let payload = URL_SAFE_NO_PAD.encode(TestTokenBuilder::new().build().to_string());
        let token = format!("{}.{}.c2lnbmF0dXJl", header, payload);

        assert_eq!(
            validator_for(&jwks).validate(&token).await.unwrap_err(),
            AuthError::MalformedHeader,
            "alg {alg} should be rejected"
        );
    }
}

// ============================================================================
// Signature and claim failures
// ============================================================================

#[tokio::test]
async fn test_forged_signature_is_invalid_signature() {
    let jwks = MockJwksServer::start().await;
    // Different private key, but claims the published kid
    let forger = TestSigningKey::secondary(TEST_KID);
    let token = forger.sign(&TestTokenBuilder::new().build()).unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::InvalidSignature
    );
}

#[tokio::test]
async fn test_tampered_payload_is_invalid_signature() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().with_permissions(&[]).build())
        .unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let escalated = TestTokenBuilder::new()
        .with_permissions(&["delete:drinks"])
        .build();
    let forged = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(escalated.to_string()),
        parts[2]
    );

    assert_eq!(
        validator_for(&jwks).validate(&forged).await.unwrap_err(),
        AuthError::InvalidSignature
    );
}

#[tokio::test]
async fn test_expired_token_is_token_expired() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().expires_in(-3600).build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::TokenExpired
    );
}

#[tokio::test]
async fn test_token_expiring_now_is_token_expired() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().expires_in(0).build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::TokenExpired
    );
}

#[tokio::test]
async fn test_leeway_accepts_recently_expired_token() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().expires_in(-30).build())
        .unwrap();

    assert!(validator_with_leeway(&jwks, 120)
        .validate(&token)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_wrong_audience_is_invalid_claims() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().with_audience("http://other-api").build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::InvalidClaims
    );
}

#[tokio::test]
async fn test_wrong_issuer_is_invalid_claims() {
    let jwks = MockJwksServer::start().await;
    let token = jwks
        .signing_key()
        .sign(
            &TestTokenBuilder::new()
                .with_issuer("https://evil.example.com/")
                .build(),
        )
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::InvalidClaims
    );
}

#[tokio::test]
async fn test_missing_required_claims_are_invalid_claims() {
    let jwks = MockJwksServer::start().await;

    for claims in [
        TestTokenBuilder::new().without_audience().build(),
        TestTokenBuilder::new().without_issuer().build(),
        TestTokenBuilder::new().without_expiry().build(),
    ] {
        let token = jwks.signing_key().sign(&claims).unwrap();
        assert_eq!(
            validator_for(&jwks).validate(&token).await.unwrap_err(),
            AuthError::InvalidClaims
        );
    }
}

// ============================================================================
// Key set failures
// ============================================================================

#[tokio::test]
async fn test_jwks_server_error_is_key_set_unavailable() {
    let jwks = MockJwksServer::with_response(ResponseTemplate::new(500)).await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::KeySetUnavailable
    );
}

#[tokio::test]
async fn test_jwks_non_json_is_key_set_unavailable() {
    let jwks =
        MockJwksServer::with_response(ResponseTemplate::new(200).set_body_string("<html>")).await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::KeySetUnavailable
    );
}

#[tokio::test]
async fn test_jwks_without_keys_is_key_set_malformed() {
    let jwks =
        MockJwksServer::with_response(ResponseTemplate::new(200).set_body_json(json!({}))).await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::KeySetMalformed
    );
}

#[tokio::test]
async fn test_jwk_without_modulus_is_key_set_malformed() {
    let jwks = MockJwksServer::with_keys(vec![json!({
        "kty": "RSA",
        "kid": TEST_KID,
        "use": "sig",
        "e": "AQAB"
    })])
    .await;
    let token = jwks
        .signing_key()
        .sign(&TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator_for(&jwks).validate(&token).await.unwrap_err(),
        AuthError::KeySetMalformed
    );
}

// ============================================================================
// Gate over verified claims
// ============================================================================

#[tokio::test]
async fn test_gate_over_verified_claims() {
    let jwks = MockJwksServer::start().await;
    let validator = validator_for(&jwks);

    let sign = |builder: TestTokenBuilder| jwks.signing_key().sign(&builder.build()).unwrap();

    let granted = validator
        .validate(&sign(
            TestTokenBuilder::new().with_permissions(&["get:drinks-detail", "post:drinks"]),
        ))
        .await
        .unwrap();
    assert!(authorize(&granted, Permission::PostDrinks.as_str()).is_ok());
    assert_eq!(
        authorize(&granted, Permission::DeleteDrinks.as_str()),
        Err(AuthError::PermissionDenied)
    );

    let without_list = validator
        .validate(&sign(TestTokenBuilder::new().without_permissions()))
        .await
        .unwrap();
    assert_eq!(
        authorize(&without_list, Permission::GetDrinksDetail.as_str()),
        Err(AuthError::InvalidClaims)
    );
}
