//! Auth orchestrator: the state machine tying codec, ledger, store and the
//! notification sink together, one short-lived transaction per flow.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Role, TokenType, User};
use crate::services::email::{Notification, Notifier};
use crate::services::{AuthError, TokenCodec, TokenLedger};
use crate::store::CredentialStore;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString, DECOY_HASH};

/// An issued token with its absolute expiry, as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Access + refresh pair returned by register, login and refresh.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// A successful register/login: the user plus their session tokens.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    ledger: TokenLedger,
    codec: TokenCodec,
    notifier: Arc<dyn Notifier>,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        ledger: TokenLedger,
        codec: TokenCodec,
        notifier: Arc<dyn Notifier>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            codec,
            notifier,
            jwt,
        }
    }

    /// Register a new user. The role is always `user` here regardless of
    /// caller input; privileged accounts go through the admin endpoint.
    pub async fn register(
        &self,
        email: String,
        password: String,
        name: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&Password::new(password))?;
        let user = User::new(email, password_hash.into_string(), name, Role::User);
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        let tokens = self.issue_session(user.id).await?;
        Ok(AuthSession { user, tokens })
    }

    /// Login with email + password. Unknown email and wrong password fail
    /// identically to resist user enumeration.
    pub async fn login(&self, email: &str, password: String) -> Result<AuthSession, AuthError> {
        let user = match self.store.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                // Burn a verification against a fixed hash so an unknown
                // email costs the same as a wrong password.
                let _ = verify_password(
                    &Password::new(password),
                    &PasswordHashString::new(DECOY_HASH.to_string()),
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let ok = verify_password(
            &Password::new(password),
            &PasswordHashString::new(user.password_hash.clone()),
        );
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        // Earlier refresh tokens stay valid until rotated or blacklisted;
        // each login is an independent session (multi-device).
        let tokens = self.issue_session(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthSession { user, tokens })
    }

    /// Rotate a refresh token: single use, blacklisted the moment it is
    /// presented, replaced by a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .decode(refresh_token)
            .map_err(|_| AuthError::Unauthenticated)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::Unauthenticated);
        }

        let record = self
            .ledger
            .find_live(refresh_token, TokenType::Refresh)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        // Rotate first. If we crash after this point the token is burned but
        // not replaced; the user re-authenticates, which is recoverable.
        self.ledger
            .blacklist(refresh_token, TokenType::Refresh)
            .await?;

        let user = self
            .store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let tokens = self.issue_session(user.id).await?;

        tracing::info!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Blacklist the presented refresh token. No new token is issued.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let record = self
            .ledger
            .find_live(refresh_token, TokenType::Refresh)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.ledger
            .blacklist(refresh_token, TokenType::Refresh)
            .await?;

        tracing::info!(user_id = %record.user_id, "User logged out");
        Ok(())
    }

    /// Issue a reset-password token and dispatch it out-of-band.
    ///
    /// An unknown email is a 404 here. That reveals whether an address is
    /// registered, unlike login; preserved as-is pending an explicit policy
    /// change.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let ttl = Duration::minutes(self.jwt.reset_password_expiry_minutes);
        let (token, expires_at) = self.codec.encode(user.id, TokenType::ResetPassword, ttl)?;
        self.ledger
            .issue(&token, user.id, TokenType::ResetPassword, expires_at)
            .await?;

        self.dispatch(&user.email, Notification::ResetPassword, &token)
            .await;

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Complete a password reset. On success every outstanding reset token
    /// for the user is invalidated, not just the one presented.
    pub async fn reset_password(&self, token: &str, new_password: String) -> Result<(), AuthError> {
        let claims = self.codec.decode(token).map_err(|_| AuthError::ResetFailed)?;
        if claims.token_type != TokenType::ResetPassword {
            return Err(AuthError::ResetFailed);
        }

        let record = self
            .ledger
            .find_live(token, TokenType::ResetPassword)
            .await?
            .ok_or(AuthError::ResetFailed)?;

        let mut user = self
            .store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::ResetFailed)?;

        user.password_hash = hash_password(&Password::new(new_password))?.into_string();
        self.store.update_user(&user).await?;

        self.ledger
            .invalidate_all(user.id, TokenType::ResetPassword)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset successful");
        Ok(())
    }

    /// Issue a verify-email token for the authenticated caller and dispatch
    /// it out-of-band.
    pub async fn send_verification_email(&self, user: &User) -> Result<(), AuthError> {
        let ttl = Duration::minutes(self.jwt.verify_email_expiry_minutes);
        let (token, expires_at) = self.codec.encode(user.id, TokenType::VerifyEmail, ttl)?;
        self.ledger
            .issue(&token, user.id, TokenType::VerifyEmail, expires_at)
            .await?;

        self.dispatch(&user.email, Notification::VerifyEmail, &token)
            .await;

        tracing::info!(user_id = %user.id, "Verification email dispatched");
        Ok(())
    }

    /// Mark the owner's email verified and invalidate all their verify
    /// tokens.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthError::VerificationFailed)?;
        if claims.token_type != TokenType::VerifyEmail {
            return Err(AuthError::VerificationFailed);
        }

        let record = self
            .ledger
            .find_live(token, TokenType::VerifyEmail)
            .await?
            .ok_or(AuthError::VerificationFailed)?;

        let mut user = self
            .store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::VerificationFailed)?;

        user.is_email_verified = true;
        self.store.update_user(&user).await?;

        self.ledger
            .invalidate_all(user.id, TokenType::VerifyEmail)
            .await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    /// Mint an access token (stateless) and a refresh token (persisted).
    async fn issue_session(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let access_ttl = Duration::minutes(self.jwt.access_expiry_minutes);
        let refresh_ttl = Duration::days(self.jwt.refresh_expiry_days);

        let (access_token, access_expires) =
            self.codec.encode(user_id, TokenType::Access, access_ttl)?;
        let (refresh_token, refresh_expires) =
            self.codec.encode(user_id, TokenType::Refresh, refresh_ttl)?;

        self.ledger
            .issue(&refresh_token, user_id, TokenType::Refresh, refresh_expires)
            .await?;

        Ok(TokenPair {
            access: IssuedToken {
                token: access_token,
                expires: access_expires,
            },
            refresh: IssuedToken {
                token: refresh_token,
                expires: refresh_expires,
            },
        })
    }

    /// Fire-and-forget delivery; the flow outcome never depends on it.
    async fn dispatch(&self, recipient: &str, kind: Notification, token: &str) {
        if let Err(err) = self.notifier.notify(recipient, kind, token).await {
            tracing::warn!(error = %err, to = %recipient, "notification dispatch failed");
        }
    }
}
