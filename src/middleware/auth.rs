//! Access guard: per-request bearer-token authorization.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::models::{TokenType, User};
use crate::services::AuthError;
use crate::AppState;

/// Middleware enforcing a valid `access`-typed bearer token and an active
/// user. The loaded [`User`] is stored in request extensions for handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthenticated)?;

    let claims = state
        .codec
        .decode(token)
        .map_err(|_| AuthError::Unauthenticated)?;

    // Only stateless access tokens authorize API requests; a refresh or
    // reset token presented here reads as unauthenticated, never as a
    // distinct error.
    if claims.token_type != TokenType::Access {
        return Err(AuthError::Unauthenticated);
    }

    let user_id = claims.subject().map_err(|_| AuthError::Unauthenticated)?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Extractor handing the authenticated user to handlers.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)?;

        Ok(CurrentUser(user))
    }
}
