//! Authorization policy helpers layered on top of the access guard.
//!
//! The guard authenticates the caller; these decide what the authenticated
//! caller may touch.

use uuid::Uuid;

use crate::models::User;
use crate::services::AuthError;

/// Admin-only operations (user listing, creation, deletion).
pub fn ensure_admin(actor: &User) -> Result<(), AuthError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Per-resource operations: a user may touch their own record, an admin any
/// record.
pub fn ensure_self_or_admin(actor: &User, target: Uuid) -> Result<(), AuthError> {
    if actor.id == target || actor.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Nobody deletes their own account, admins included.
pub fn ensure_not_self(actor: &User, target: Uuid) -> Result<(), AuthError> {
    if actor.id == target {
        Err(AuthError::CannotDeleteSelf)
    } else {
        Ok(())
    }
}
