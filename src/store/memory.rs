//! In-memory credential store used by the integration tests.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{TokenRecord, TokenType, User};
use crate::store::{CredentialStore, SortOrder, StoreError, UserPage, UserQuery, UserSort};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    tokens: Mutex<Vec<TokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: apply a mutation to a stored user outside the API surface,
    /// e.g. deactivating an account or promoting it to admin.
    pub fn mutate_user<F: FnOnce(&mut User)>(&self, id: Uuid, f: F) -> bool {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        }
    }

    pub fn token_count(&self, user_id: Uuid, token_type: TokenType) -> usize {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.token_type == token_type)
            .count()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }
        if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        let removed = users.len() < before;
        if removed {
            // Mirror the FK cascade of the Postgres schema.
            self.tokens.lock().unwrap().retain(|t| t.user_id != id);
        }
        Ok(removed)
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, StoreError> {
        let users = self.users.lock().unwrap();
        let mut matched: Vec<User> = users
            .iter()
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| {
                query.name.as_ref().map_or(true, |needle| {
                    u.name
                        .as_deref()
                        .map_or(false, |n| n.to_lowercase().contains(&needle.to_lowercase()))
                })
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = match query.sort_by {
                UserSort::CreatedAt => a.created_at.cmp(&b.created_at),
                UserSort::Email => a.email.cmp(&b.email),
                UserSort::Name => a.name.cmp(&b.name),
            };
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matched.len() as i64;
        let start = (query.offset() as usize).min(matched.len());
        let end = (start + query.page_size as usize).min(matched.len());

        Ok(UserPage {
            users: matched[start..end].to_vec(),
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError> {
        self.tokens.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_live_token(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token && t.token_type == token_type && !t.blacklisted)
            .cloned())
    }

    async fn blacklist_token(&self, token: &str, token_type: TokenType) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(record) = tokens
            .iter_mut()
            .find(|t| t.token == token && t.token_type == token_type)
        {
            record.blacklisted = true;
        }
        Ok(())
    }

    async fn delete_tokens_for_user(
        &self,
        user_id: Uuid,
        token_type: TokenType,
    ) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| !(t.user_id == user_id && t.token_type == token_type));
        Ok((before - tokens.len()) as u64)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
