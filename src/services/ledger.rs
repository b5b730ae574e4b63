//! Token ledger: the server-side registry of issued non-access tokens.
//!
//! Expiry is the codec's concern; the ledger only answers "does a live
//! record exist". An absent record and a blacklisted record are deliberately
//! indistinguishable to callers.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{TokenRecord, TokenType};
use crate::store::{CredentialStore, StoreError};

#[derive(Clone)]
pub struct TokenLedger {
    store: Arc<dyn CredentialStore>,
}

impl TokenLedger {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Persist a newly issued token. Multiple live tokens of the same type
    /// per user are allowed (e.g. multi-device refresh tokens).
    pub async fn issue(
        &self,
        token: &str,
        owner: Uuid,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError> {
        debug_assert!(token_type != TokenType::Access, "access tokens are stateless");

        let record = TokenRecord::new(token.to_string(), owner, token_type, expires_at);
        self.store.insert_token(&record).await?;
        Ok(record)
    }

    pub async fn find_live(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> Result<Option<TokenRecord>, StoreError> {
        self.store.find_live_token(token, token_type).await
    }

    /// Soft-revoke a token. No-op if the record does not exist.
    pub async fn blacklist(&self, token: &str, token_type: TokenType) -> Result<(), StoreError> {
        self.store.blacklist_token(token, token_type).await
    }

    /// Delete every record of `token_type` for `owner`, preventing replay of
    /// any outstanding token of that type.
    pub async fn invalidate_all(
        &self,
        owner: Uuid,
        token_type: TokenType,
    ) -> Result<u64, StoreError> {
        self.store.delete_tokens_for_user(owner, token_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn ledger() -> TokenLedger {
        TokenLedger::new(Arc::new(MemoryStore::new()))
    }

    fn expiry() -> DateTime<Utc> {
        Utc::now() + Duration::days(1)
    }

    #[tokio::test]
    async fn issued_token_is_live() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger
            .issue("tok", owner, TokenType::Refresh, expiry())
            .await
            .unwrap();

        let found = ledger.find_live("tok", TokenType::Refresh).await.unwrap();
        assert_eq!(found.unwrap().user_id, owner);
    }

    #[tokio::test]
    async fn type_mismatch_reads_as_not_found() {
        let ledger = ledger();
        ledger
            .issue("tok", Uuid::new_v4(), TokenType::Refresh, expiry())
            .await
            .unwrap();

        let found = ledger
            .find_live("tok", TokenType::ResetPassword)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn blacklisted_token_reads_as_not_found() {
        let ledger = ledger();
        ledger
            .issue("tok", Uuid::new_v4(), TokenType::Refresh, expiry())
            .await
            .unwrap();

        ledger.blacklist("tok", TokenType::Refresh).await.unwrap();
        assert!(ledger
            .find_live("tok", TokenType::Refresh)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn blacklist_is_idempotent_and_tolerates_absence() {
        let ledger = ledger();
        // Absent token: no-op, not an error.
        ledger
            .blacklist("missing", TokenType::Refresh)
            .await
            .unwrap();

        ledger
            .issue("tok", Uuid::new_v4(), TokenType::Refresh, expiry())
            .await
            .unwrap();
        ledger.blacklist("tok", TokenType::Refresh).await.unwrap();
        ledger.blacklist("tok", TokenType::Refresh).await.unwrap();
    }

    #[tokio::test]
    async fn invalidate_all_removes_only_that_type_and_owner() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        ledger
            .issue("r1", owner, TokenType::ResetPassword, expiry())
            .await
            .unwrap();
        ledger
            .issue("r2", owner, TokenType::ResetPassword, expiry())
            .await
            .unwrap();
        ledger
            .issue("v1", owner, TokenType::VerifyEmail, expiry())
            .await
            .unwrap();
        ledger
            .issue("r3", other, TokenType::ResetPassword, expiry())
            .await
            .unwrap();

        let removed = ledger
            .invalidate_all(owner, TokenType::ResetPassword)
            .await
            .unwrap();
        assert_eq!(removed, 2);

        assert!(ledger
            .find_live("v1", TokenType::VerifyEmail)
            .await
            .unwrap()
            .is_some());
        assert!(ledger
            .find_live("r3", TokenType::ResetPassword)
            .await
            .unwrap()
            .is_some());
    }
}
