//! Token codec: signed, self-contained tokens carrying subject, type and
//! expiry. Decoding verifies signature and expiry only; revocation checks
//! against the ledger are a separate, explicit step left to callers.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenDecodeError {
    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Token ID. Makes every issued token distinct even within the same
    /// second, so rotation never collides with the token it replaces.
    pub jti: String,
}

impl Claims {
    pub fn subject(&self) -> Result<Uuid, TokenDecodeError> {
        self.sub.parse().map_err(|_| TokenDecodeError::Malformed)
    }
}

/// HS256 codec around the process-wide signing secret, built once at startup.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Encode a signed token expiring `ttl` from now. Returns the token and
    /// its absolute expiry.
    pub fn encode(
        &self,
        subject: Uuid,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), anyhow::Error> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            sub: subject.to_string(),
            token_type,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))?;

        Ok((token, expires_at))
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenDecodeError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenDecodeError::Expired,
                ErrorKind::InvalidSignature => TokenDecodeError::SignatureInvalid,
                _ => TokenDecodeError::Malformed,
            }
        })?;

        Ok(data.claims)
    }
}
