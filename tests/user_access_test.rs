mod common;

use axum::http::StatusCode;
use common::{access_token, body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_list_users_is_admin_only() {
    let app = TestApp::spawn();
    let body = app.register("alice@example.com", "password123").await;
    let token = access_token(&body);

    let res = app.get_auth("/v1/users", &token).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Not enough permissions");
}

#[tokio::test]
async fn test_admin_lists_users_with_pagination() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let token = access_token(&admin);
    for i in 0..3 {
        app.register(&format!("user{i}@example.com"), "password123")
            .await;
    }

    let res = app.get_auth("/v1/users?page=1&page_size=2", &token).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["total_results"], 4);
}

#[tokio::test]
async fn test_admin_filters_by_role() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let token = access_token(&admin);
    app.register("plain@example.com", "password123").await;

    let res = app.get_auth("/v1/users?role=admin", &token).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["email"], "admin@example.com");
}

#[tokio::test]
async fn test_admin_sorts_by_email() {
    let app = TestApp::spawn();
    let admin = app.register_admin("zadmin@example.com", "password123").await;
    let token = access_token(&admin);
    app.register("bob@example.com", "password123").await;
    app.register("alice@example.com", "password123").await;

    let res = app
        .get_auth("/v1/users?sort_by=email&order=asc", &token)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let emails: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec!["alice@example.com", "bob@example.com", "zadmin@example.com"]
    );
}

#[tokio::test]
async fn test_admin_creates_user_with_role() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let token = access_token(&admin);

    let res = app
        .post_json_auth(
            "/v1/users",
            &token,
            json!({
                "email": "second-admin@example.com",
                "password": "password123",
                "name": "Second Admin",
                "role": "admin"
            }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["role"], "admin");

    // The created account can log in straight away.
    app.login("second-admin@example.com", "password123").await;
}

#[tokio::test]
async fn test_create_user_is_admin_only() {
    let app = TestApp::spawn();
    let body = app.register("plain@example.com", "password123").await;
    let token = access_token(&body);

    let res = app
        .post_json_auth(
            "/v1/users",
            &token,
            json!({ "email": "new@example.com", "password": "password123" }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_reads_own_record_but_not_others() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    let bob = app.register("bob@example.com", "password123").await;
    let alice_token = access_token(&alice);
    let bob_id = common::user_id(&bob);

    let own = app
        .get_auth(&format!("/v1/users/{}", common::user_id(&alice)), &alice_token)
        .await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = app
        .get_auth(&format!("/v1/users/{bob_id}"), &alice_token)
        .await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_reads_any_record() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let user = app.register("user@example.com", "password123").await;

    let res = app
        .get_auth(
            &format!("/v1/users/{}", common::user_id(&user)),
            &access_token(&admin),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_user() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;

    let res = app
        .get_auth(
            &format!("/v1/users/{}", uuid::Uuid::new_v4()),
            &access_token(&admin),
        )
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = body_json(res).await;
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_user_updates_own_name_and_password() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    let id = common::user_id(&alice);
    let token = access_token(&alice);

    let res = app
        .patch_json_auth(
            &format!("/v1/users/{id}"),
            &token,
            json!({ "name": "Alice Prime", "password": "new-password-456" }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["name"], "Alice Prime");

    app.login("alice@example.com", "new-password-456").await;
}

#[tokio::test]
async fn test_user_cannot_change_own_role() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    let id = common::user_id(&alice);

    let res = app
        .patch_json_auth(
            &format!("/v1/users/{id}"),
            &access_token(&alice),
            json!({ "role": "admin" }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_changes_role_and_verified_flag() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let user = app.register("user@example.com", "password123").await;
    let id = common::user_id(&user);

    let res = app
        .patch_json_auth(
            &format!("/v1/users/{id}"),
            &access_token(&admin),
            json!({ "role": "admin", "is_email_verified": true }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["is_email_verified"], true);
}

#[tokio::test]
async fn test_update_rejects_taken_email() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    app.register("bob@example.com", "password123").await;

    let res = app
        .patch_json_auth(
            &format!("/v1/users/{}", common::user_id(&alice)),
            &access_token(&alice),
            json!({ "email": "bob@example.com" }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Email already taken");
}

#[tokio::test]
async fn test_admin_deletes_user() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let user = app.register("user@example.com", "password123").await;
    let id = common::user_id(&user);

    let res = app
        .delete_auth(&format!("/v1/users/{id}"), &access_token(&admin))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The deleted user's still-valid access token now fails the guard.
    let res = app
        .get_auth(&format!("/v1/users/{id}"), &access_token(&user))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_is_admin_only() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    let bob = app.register("bob@example.com", "password123").await;

    let res = app
        .delete_auth(
            &format!("/v1/users/{}", common::user_id(&bob)),
            &access_token(&alice),
        )
        .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_delete_themselves() {
    let app = TestApp::spawn();
    let admin = app.register_admin("admin@example.com", "password123").await;
    let id = common::user_id(&admin);

    let res = app
        .delete_auth(&format!("/v1/users/{id}"), &access_token(&admin))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Users cannot delete themselves");
}

#[tokio::test]
async fn test_inactive_user_is_rejected_by_guard() {
    let app = TestApp::spawn();
    let alice = app.register("alice@example.com", "password123").await;
    let id = common::user_id(&alice);
    app.store.mutate_user(id, |u| u.is_active = false);

    let res = app.get_auth(&format!("/v1/users/{id}"), &access_token(&alice)).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Inactive user");
}
