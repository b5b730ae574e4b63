//! PostgreSQL credential store.

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use crate::models::{TokenRecord, TokenType, User};
use crate::store::{CredentialStore, StoreError, UserPage, UserQuery};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, is_active, is_email_verified, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.is_email_verified)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, is_active, is_email_verified, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, is_active, is_email_verified, created_at \
             FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET email = $2, name = $3, password_hash = $4, role = $5, \
             is_active = $6, is_email_verified = $7 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.is_email_verified)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        // Token rows cascade via the foreign key.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, StoreError> {
        let mut select = QueryBuilder::new(
            "SELECT id, email, name, password_hash, role, is_active, is_email_verified, created_at FROM users",
        );
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users");

        for builder in [&mut select, &mut count] {
            let mut clause = " WHERE ";
            if let Some(role) = query.role {
                builder.push(clause).push("role = ").push_bind(role.as_str());
                clause = " AND ";
            }
            if let Some(name) = &query.name {
                builder
                    .push(clause)
                    .push("LOWER(name) LIKE ")
                    .push_bind(format!("%{}%", name.to_lowercase()));
            }
        }

        // Sort column comes from the enumerated mapping, never from user input.
        select
            .push(" ORDER BY ")
            .push(query.sort_by.column())
            .push(" ")
            .push(query.order.sql())
            .push(" LIMIT ")
            .push_bind(query.page_size as i64)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let users = select
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get(0)?;

        Ok(UserPage {
            users,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tokens (token, token_type, user_id, expires_at, blacklisted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.token)
        .bind(record.token_type.as_str())
        .bind(record.user_id)
        .bind(record.expires_at)
        .bind(record.blacklisted)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_live_token(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT token, token_type, user_id, expires_at, blacklisted, created_at \
             FROM tokens WHERE token = $1 AND token_type = $2 AND blacklisted = FALSE",
        )
        .bind(token)
        .bind(token_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn blacklist_token(&self, token: &str, token_type: TokenType) -> Result<(), StoreError> {
        sqlx::query("UPDATE tokens SET blacklisted = TRUE WHERE token = $1 AND token_type = $2")
            .bind(token)
            .bind(token_type.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_tokens_for_user(
        &self,
        user_id: Uuid,
        token_type: TokenType,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND token_type = $2")
            .bind(user_id)
            .bind(token_type.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
