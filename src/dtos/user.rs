use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::user::UserResponse;
use crate::models::Role;
use crate::store::{SortOrder, UserSort};

/// Admin user creation. Unlike register, the role is honoured.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[schema(example = "John Doe")]
    pub name: Option<String>,

    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Partial update; absent fields are left untouched. Role and verification
/// flag changes require an admin caller.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub name: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    pub role: Option<Role>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    /// Case-insensitive substring match on display name.
    pub name: Option<String>,
    pub sort_by: Option<UserSort>,
    pub order: Option<SortOrder>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub results: Vec<UserResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total_results: i64,
}
