//! Permission gate.

use crate::auth::claims::Claims;
use crate::errors::AuthError;
use std::fmt;

/// Permission required by a gated catalog operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read the long-form catalog.
    GetDrinksDetail,

    /// Create a drink.
    PostDrinks,

    /// Update a drink.
    PatchDrinks,

    /// Delete a drink.
    DeleteDrinks,
}

impl Permission {
    /// The permission string as it appears in a token's `permissions` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::GetDrinksDetail => "get:drinks-detail",
            Permission::PostDrinks => "post:drinks",
            Permission::PatchDrinks => "patch:drinks",
            Permission::DeleteDrinks => "delete:drinks",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `claims` grant `required`.
///
/// # Errors
///
/// - `AuthError::InvalidClaims` if the token carries no permission list
/// - `AuthError::PermissionDenied` if the list does not contain `required`
pub fn authorize(claims: &Claims, required: &str) -> Result<(), AuthError> {
    match claims.has_permission(required) {
        Some(true) => Ok(()),
        Some(false) => {
            tracing::debug!(target: "drinks.auth.gate", permission = %required, "Permission not granted");
            Err(AuthError::PermissionDenied)
        }
        None => {
            tracing::debug!(target: "drinks.auth.gate", "Token has no permissions claim");
            Err(AuthError::InvalidClaims)
        }
    }
}
