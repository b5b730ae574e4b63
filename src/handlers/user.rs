//! User management handlers. Listing, creation and deletion are admin-only;
//! reads and updates are self-or-admin.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserListResponse};
use crate::dtos::ErrorResponse;
use crate::middleware::CurrentUser;
use crate::models::user::UserResponse;
use crate::services::{policy, AuthError};
use crate::store::UserQuery;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Email already taken", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    policy::ensure_admin(&actor)?;
    req.validate()?;

    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Paginated user listing", body = UserListResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, AuthError> {
    policy::ensure_admin(&actor)?;

    let defaults = UserQuery::default();
    let query = UserQuery {
        role: query.role,
        name: query.name,
        sort_by: query.sort_by.unwrap_or(defaults.sort_by),
        order: query.order.unwrap_or(defaults.order),
        page: query.page.unwrap_or(defaults.page).max(1),
        page_size: query.page_size.unwrap_or(defaults.page_size).clamp(1, 100),
    };

    let page = state.users.list(&query).await?;

    Ok(Json(UserListResponse {
        results: page.users.into_iter().map(UserResponse::from).collect(),
        page: page.page,
        page_size: page.page_size,
        total_results: page.total,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 403, description = "Not the owner and not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state.users.get(&actor, user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Email already taken", body = ErrorResponse),
        (status = 403, description = "Not the owner and not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    req.validate()?;

    let user = state.users.update(&actor, user_id, req).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Self-deletion rejected", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AuthError> {
    policy::ensure_admin(&actor)?;

    state.users.delete(&actor, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
