//! Server-tracked token records.
//!
//! Access tokens are stateless and never persisted; every other token type
//! gets a row here so it can be revoked server-side while still being
//! cryptographically valid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Token type discriminator. Wire values match the `type` claim inside the
/// encoded token itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::ResetPassword => "resetPassword",
            TokenType::VerifyEmail => "verifyEmail",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown token type: {0}")]
pub struct UnknownTokenType(String);

impl std::str::FromStr for TokenType {
    type Err = UnknownTokenType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            "resetPassword" => Ok(TokenType::ResetPassword),
            "verifyEmail" => Ok(TokenType::VerifyEmail),
            other => Err(UnknownTokenType(other.to_string())),
        }
    }
}

impl TryFrom<String> for TokenType {
    type Error = UnknownTokenType;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A persisted non-access token. The encoded token string is the primary key.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRecord {
    pub token: String,
    #[sqlx(try_from = "String")]
    pub token_type: TokenType,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(
        token: String,
        user_id: Uuid,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            token_type,
            user_id,
            expires_at,
            blacklisted: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
