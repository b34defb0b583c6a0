//! Drinks service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Every
//! authentication failure keeps its own kind and machine-readable code so
//! callers can tell them apart. Persistence detail is logged server-side and
//! never returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token verification and authorization failures.
///
/// Everything except `PermissionDenied` is an authentication failure (401).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingAuthorizationHeader,

    #[error("Authorization header must be in the form 'Bearer <token>'.")]
    InvalidAuthorizationHeader,

    #[error("Unable to parse the token header.")]
    MalformedHeader,

    #[error("Unable to find the appropriate key.")]
    UnknownSigningKey,

    #[error("Token signature could not be verified.")]
    InvalidSignature,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Unable to fetch the signing key set.")]
    KeySetUnavailable,

    #[error("The signing key set is malformed.")]
    KeySetMalformed,

    #[error("Permission not found.")]
    PermissionDenied,
}

impl AuthError {
    /// Machine-readable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorizationHeader => "authorization_header_missing",
            AuthError::InvalidAuthorizationHeader => "invalid_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::UnknownSigningKey => "unknown_signing_key",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::KeySetMalformed => "key_set_malformed",
            AuthError::PermissionDenied => "permission_denied",
        }
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::PermissionDenied => 403,
            _ => 401,
        }
    }
}

/// Drinks service error type.
///
/// Maps to HTTP status codes:
/// - Auth: 401, or 403 for `PermissionDenied`
/// - InvalidRequest: 400 Bad Request
/// - NotFound: 404 Not Found
/// - Persistence: 422 Unprocessable Entity
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum DrinksError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DrinksError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            DrinksError::Auth(err) => err.status_code(),
            DrinksError::InvalidRequest(_) => 400,
            DrinksError::NotFound(_) => 404,
            DrinksError::Persistence(_) => 422,
            DrinksError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DrinksError::Auth(err) => err.code(),
            DrinksError::InvalidRequest(_) => "bad_request",
            DrinksError::NotFound(_) => "not_found",
            DrinksError::Persistence(_) => "unprocessable",
            DrinksError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    code: &'static str,
    message: String,
}

impl IntoResponse for DrinksError {
    fn into_response(self) -> Response {
        let message = match &self {
            DrinksError::Auth(err) => {
                tracing::debug!(target: "drinks.auth", code = err.code(), "Request rejected");
                err.to_string()
            }
            DrinksError::InvalidRequest(reason) => reason.clone(),
            DrinksError::NotFound(resource) => resource.clone(),
            DrinksError::Persistence(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "drinks.database", error = %err, "Persistence operation failed");
                "unprocessable".to_string()
            }
            DrinksError::Internal(err) => {
                tracing::error!(target: "drinks.internal", error = %err, "Internal error");
                "internal server error".to_string()
            }
        };

        let status_code = self.status_code();
        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = ErrorResponse {
            success: false,
            error: status_code,
            code: self.code(),
            message,
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            let header = format!(
                "Bearer realm=\"drinks-api\", error=\"invalid_token\", error_description=\"{}\"",
                self.code()
            );
            if let Ok(header_value) = header.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
