//! Credential store: persistence contract for user and token records.
//!
//! The Postgres backend is the production store; the in-memory backend backs
//! the integration tests and mirrors the same per-operation atomicity.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Role, TokenRecord, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email already registered")]
    DuplicateEmail,
}

/// Enumerated sortable fields for user listings. Resolved through a static
/// column mapping so no unintended column is ever exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    CreatedAt,
    Email,
    Name,
}

impl UserSort {
    pub fn column(&self) -> &'static str {
        match self {
            UserSort::CreatedAt => "created_at",
            UserSort::Email => "email",
            UserSort::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter, sort and pagination for the admin user listing.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// Case-insensitive substring match on display name.
    pub name: Option<String>,
    pub sort_by: UserSort,
    pub order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            role: None,
            name: None,
            sort_by: UserSort::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            page_size: 20,
        }
    }
}

impl UserQuery {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.page_size as i64
    }
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Persistence contract for user records and server-tracked token records.
///
/// Each operation is individually atomic; no cross-operation transactions are
/// required by the flows built on top of this.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Email comparison is case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    /// Hard delete; associated token records go with the user.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, StoreError>;

    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError>;

    /// Returns a record only if it exists, matches the type, and is not
    /// blacklisted. Expiry is not checked here.
    async fn find_live_token(
        &self,
        token: &str,
        token_type: crate::models::TokenType,
    ) -> Result<Option<TokenRecord>, StoreError>;

    /// Idempotent; a missing record is a no-op, not an error.
    async fn blacklist_token(
        &self,
        token: &str,
        token_type: crate::models::TokenType,
    ) -> Result<(), StoreError>;

    async fn delete_tokens_for_user(
        &self,
        user_id: Uuid,
        token_type: crate::models::TokenType,
    ) -> Result<u64, StoreError>;

    async fn health(&self) -> Result<(), StoreError>;
}
