use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dtos::ErrorResponse;
use crate::store::StoreError;

/// Flow-level error taxonomy. Every auth/user operation terminates with one
/// of these; the boundary maps kinds to transport status codes, keeping
/// authentication failure messages deliberately generic.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already taken")]
    EmailTaken,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Please authenticate")]
    Unauthenticated,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Not found")]
    NotFound,

    #[error("Password reset failed")]
    ResetFailed,

    #[error("Email verification failed")]
    VerificationFailed,

    #[error("Users cannot delete themselves")]
    CannotDeleteSelf,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("database error: {0}")]
    Database(StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::EmailTaken,
            other => AuthError::Database(other),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::EmailTaken => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::InactiveUser => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AuthError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AuthError::ResetFailed => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::VerificationFailed => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::CannotDeleteSelf => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string())
            }
            // Never leak internals to the client.
            AuthError::Database(err) => {
                tracing::error!(error = %err, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AuthError::Internal(err) => {
                tracing::error!(error = %err, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn auth_failures_map_to_401() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::Unauthenticated,
            AuthError::ResetFailed,
            AuthError::VerificationFailed,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn internal_errors_return_generic_envelope() {
        let response = AuthError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_email_from_store_becomes_email_taken() {
        let err: AuthError = StoreError::DuplicateEmail.into();
        assert!(matches!(err, AuthError::EmailTaken));
    }
}
