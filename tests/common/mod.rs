//! Shared setup for integration tests.
//!
//! Tests run the full router against an in-memory credential store and a
//! recording notifier, so no Postgres or SMTP server is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use identity_service::{
    build_router,
    config::{Config, DatabaseConfig, Environment, JwtConfig},
    models::Role,
    services::{AuthService, Notifier, RecordingNotifier, TokenCodec, TokenLedger, UserService},
    store::memory::MemoryStore,
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> Config {
    Config {
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        log_level: "warn".to_string(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes!".to_string(),
            access_expiry_minutes: 30,
            refresh_expiry_days: 30,
            reset_password_expiry_minutes: 10,
            verify_email_expiry_minutes: 10,
        },
        smtp: None,
        bootstrap: None,
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        identity_service::init_tracing("warn");

        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let codec = TokenCodec::new(&config.jwt);
        let ledger = TokenLedger::new(store.clone());
        let auth = AuthService::new(
            store.clone(),
            ledger,
            codec.clone(),
            notifier.clone() as Arc<dyn Notifier>,
            config.jwt.clone(),
        );
        let users = UserService::new(store.clone());

        let state = AppState {
            config,
            store: store.clone(),
            codec,
            auth,
            users,
        };

        Self {
            router: build_router(state),
            store,
            notifier,
        }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("router never fails")
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json_auth(&self, path: &str, token: &str, body: Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("GET")
                .uri(path)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn patch_json_auth(&self, path: &str, token: &str, body: Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("PATCH")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(path)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Register a user and return the parsed response body.
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let res = self
            .post_json(
                "/v1/auth/register",
                serde_json::json!({ "email": email, "password": password, "name": "Test User" }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        body_json(res).await
    }

    /// Register a user and promote them to admin directly in the store,
    /// then log in again so the session reflects the new role.
    pub async fn register_admin(&self, email: &str, password: &str) -> Value {
        let body = self.register(email, password).await;
        let id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
        assert!(self.store.mutate_user(id, |u| u.role = Role::Admin));
        self.login(email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Value {
        let res = self
            .post_json(
                "/v1/auth/login",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }
}

pub fn access_token(auth_body: &Value) -> String {
    auth_body["tokens"]["access"]["token"]
        .as_str()
        .expect("access token present")
        .to_string()
}

pub fn refresh_token(auth_body: &Value) -> String {
    auth_body["tokens"]["refresh"]["token"]
        .as_str()
        .expect("refresh token present")
        .to_string()
}

pub fn user_id(auth_body: &Value) -> Uuid {
    auth_body["user"]["id"]
        .as_str()
        .expect("user id present")
        .parse()
        .expect("user id is a uuid")
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
