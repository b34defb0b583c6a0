//! Authorization middleware for gated drink operations.
//!
//! Extracts the bearer token, verifies it against the identity provider's
//! current key set, checks the route's required permission, and injects the
//! verified `Claims` into request extensions.

use crate::auth::{authorize, JwtValidator, Permission};
use crate::errors::{AuthError, DrinksError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authorization middleware.
///
/// One instance per gated route; `permission` is what that route requires.
#[derive(Clone)]
pub struct AuthState {
    /// JWT validator with JWKS client.
    pub jwt_validator: Arc<JwtValidator>,

    /// Permission the route requires.
    pub permission: Permission,
}

/// Extract the bearer token from the Authorization header.
///
/// The header must be exactly `<scheme> <token>` with a case-insensitive
/// `Bearer` scheme.
///
/// # Errors
///
/// - `AuthError::MissingAuthorizationHeader` if the header is absent
/// - `AuthError::InvalidAuthorizationHeader` for any other shape
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get("authorization").ok_or_else(|| {
        tracing::debug!(target: "drinks.middleware.auth", "Missing Authorization header");
        AuthError::MissingAuthorizationHeader
    })?;

    let value = value.to_str().map_err(|_| {
        tracing::debug!(target: "drinks.middleware.auth", "Authorization header is not ASCII");
        AuthError::InvalidAuthorizationHeader
    })?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => {
            tracing::debug!(target: "drinks.middleware.auth", "Invalid Authorization header format");
            Err(AuthError::InvalidAuthorizationHeader)
        }
    }
}

/// Authorization middleware.
///
/// # Response
///
/// - 401 if the token is missing or fails verification
/// - 403 if the token lacks the route's permission
/// - Otherwise continues with `Claims` in request extensions
#[instrument(skip_all, name = "drinks.middleware.auth")]
pub async fn require_permission(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, DrinksError> {
    let token = extract_bearer_token(req.headers())?;

    let claims = state.jwt_validator.validate(token).await?;
    authorize(&claims, state.permission.as_str())?;

    tracing::debug!(target: "drinks.middleware.auth", permission = %state.permission, "Request authorized");

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap(),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_extract_bearer_scheme_is_case_insensitive() {
        assert_eq!(
            extract_bearer_token(&headers_with("bearer abc")).unwrap(),
            "abc"
        );
        assert_eq!(
            extract_bearer_token(&headers_with("BEARER abc")).unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_extract_missing_header() {
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingAuthorizationHeader)
        );
    }

    #[test]
    fn test_extract_rejects_bad_shapes() {
        for value in ["Basic abc", "Bearer", "Bearer a b", "abc", "Token abc"] {
            assert_eq!(
                extract_bearer_token(&headers_with(value)),
                Err(AuthError::InvalidAuthorizationHeader),
                "header {value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_extract_empty_header_is_invalid() {
        assert_eq!(
            extract_bearer_token(&headers_with("")),
            Err(AuthError::InvalidAuthorizationHeader)
        );
    }
}
