//! User management: admin CRUD plus the self-service update path.

use std::sync::Arc;
use uuid::Uuid;

use crate::dtos::user::{CreateUserRequest, UpdateUserRequest};
use crate::models::{Role, User};
use crate::services::{policy, AuthError};
use crate::store::{CredentialStore, UserPage, UserQuery};
use crate::utils::{hash_password, Password};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Admin-only creation; the requested role is honoured here.
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, AuthError> {
        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&Password::new(req.password))?;
        let mut user = User::new(
            req.email,
            password_hash.into_string(),
            req.name,
            req.role.unwrap_or(Role::User),
        );
        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }
        if let Some(is_email_verified) = req.is_email_verified {
            user.is_email_verified = is_email_verified;
        }

        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role.as_str(), "User created");
        Ok(user)
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        policy::ensure_self_or_admin(actor, user.id)?;
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<User, AuthError> {
        let mut user = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        policy::ensure_self_or_admin(actor, user.id)?;

        // Privilege changes stay admin-only even on one's own record.
        if req.role.is_some() || req.is_email_verified.is_some() {
            policy::ensure_admin(actor)?;
        }

        if let Some(email) = req.email {
            if !email.eq_ignore_ascii_case(&user.email) {
                if self.store.find_user_by_email(&email).await?.is_some() {
                    return Err(AuthError::EmailTaken);
                }
                user.email = email;
            }
        }
        if let Some(name) = req.name {
            user.name = Some(name);
        }
        if let Some(password) = req.password {
            user.password_hash = hash_password(&Password::new(password))?.into_string();
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(is_email_verified) = req.is_email_verified {
            user.is_email_verified = is_email_verified;
        }

        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Admin-only; self-deletion is rejected regardless of role.
    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        policy::ensure_not_self(actor, user.id)?;

        self.store.delete_user(user.id).await?;

        tracing::info!(user_id = %user.id, "User deleted");
        Ok(())
    }

    pub async fn list(&self, query: &UserQuery) -> Result<UserPage, AuthError> {
        Ok(self.store.list_users(query).await?)
    }

    /// Seed the initial admin account if it does not exist yet.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            tracing::info!("Bootstrap admin already exists");
            return Ok(());
        }

        let password_hash = hash_password(&Password::new(password.to_string()))?;
        let mut admin = User::new(
            email.to_string(),
            password_hash.into_string(),
            Some("Admin".to_string()),
            Role::Admin,
        );
        admin.is_email_verified = true;

        self.store.insert_user(&admin).await?;
        tracing::info!(user_id = %admin.id, "Bootstrap admin created");
        Ok(())
    }
}
