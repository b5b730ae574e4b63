pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, Environment};
use crate::services::{AuthService, TokenCodec, UserService};
use crate::store::CredentialStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh_tokens,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::send_verification_email,
        handlers::auth::verify_email,
        handlers::user::create_user,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::update_user,
        handlers::user::delete_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::LogoutRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::ResetPasswordRequest,
            dtos::auth::AuthResponse,
            dtos::user::CreateUserRequest,
            dtos::user::UpdateUserRequest,
            dtos::user::UserListResponse,
            models::user::UserResponse,
            models::user::Role,
            services::auth::IssuedToken,
            services::auth::TokenPair,
            store::UserSort,
            store::SortOrder,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Token lifecycle: register, login, refresh, logout, password reset, email verification"),
        (name = "Users", description = "User record management"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub codec: TokenCodec,
    pub auth: AuthService,
    pub users: UserService,
}

/// Initialize the tracing subscriber. Safe to call more than once in tests.
pub fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/v1/auth/register", post(handlers::auth::register))
        .route("/v1/auth/login", post(handlers::auth::login))
        .route("/v1/auth/logout", post(handlers::auth::logout))
        .route(
            "/v1/auth/refresh-tokens",
            post(handlers::auth::refresh_tokens),
        )
        .route(
            "/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/v1/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .route("/v1/auth/verify-email", post(handlers::auth::verify_email));

    // Everything behind the access guard.
    let protected = Router::new()
        .route(
            "/v1/auth/send-verification-email",
            post(handlers::auth::send_verification_email),
        )
        .route(
            "/v1/users",
            post(handlers::user::create_user).get(handlers::user::list_users),
        )
        .route(
            "/v1/users/:user_id",
            get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut router = Router::new().merge(public).merge(protected);

    if state.config.environment == Environment::Dev {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
