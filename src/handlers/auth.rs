//! Authentication handlers.
//!
//! Route table and status codes:
//! - `POST /v1/auth/register` 201
//! - `POST /v1/auth/login` 200
//! - `POST /v1/auth/logout` 204
//! - `POST /v1/auth/refresh-tokens` 200
//! - `POST /v1/auth/forgot-password` 204
//! - `POST /v1/auth/reset-password?token=` 204
//! - `POST /v1/auth/send-verification-email` 204 (bearer)
//! - `POST /v1/auth/verify-email?token=` 204

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::dtos::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, TokenQuery,
};
use crate::dtos::ErrorResponse;
use crate::middleware::CurrentUser;
use crate::services::{AuthError, TokenPair};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Email already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    req.validate()?;

    let session = state.auth.register(req.email, req.password, req.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: session.user.into(),
            tokens: session.tokens,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let session = state.auth.login(&req.email, req.password).await?;

    Ok(Json(AuthResponse {
        user: session.user.into(),
        tokens: session.tokens,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh-tokens",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid, rotated or unknown refresh token", body = ErrorResponse),
        (status = 404, description = "Token owner no longer exists", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn refresh_tokens(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let tokens = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 404, description = "Token not found", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<StatusCode, AuthError> {
    state.auth.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 204, description = "Reset token dispatched"),
        (status = 404, description = "No user with this email", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    req.validate()?;

    state.auth.forgot_password(&req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    params(TokenQuery),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 401, description = "Password reset failed", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    req.validate()?;

    state.auth.reset_password(&query.token, req.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/auth/send-verification-email",
    responses(
        (status = 204, description = "Verification token dispatched"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn send_verification_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AuthError> {
    state.auth.send_verification_email(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-email",
    params(TokenQuery),
    responses(
        (status = 204, description = "Email verified"),
        (status = 401, description = "Email verification failed", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, AuthError> {
    state.auth.verify_email(&query.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
