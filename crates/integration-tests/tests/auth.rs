//! Account and token tests.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use woo_bridge_integration_tests::{TestApp, TestResponse};
use woo_bridge_server::services::auth::{DEFAULT_TOKEN_NAME, hash_token};

const PASSWORD: &str = "correct horse battery";

async fn login(app: &TestApp, email: &str, password: &str) -> TestResponse {
    app.request(
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await
}

#[tokio::test]
async fn register_returns_user_and_bearer_token() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["message"], "User registered successfully");
    assert_eq!(response.body["token_type"], "Bearer");
    assert_eq!(response.body["user"]["name"], "Ada Lovelace");
    assert_eq!(response.body["user"]["email"], "ada@example.com");
    assert!(response.body["user"].get("password").is_none());
    assert!(response.body["user"].get("password_hash").is_none());

    let token = response.body["token"].as_str().unwrap();
    let (id, secret) = token.split_once('|').unwrap();
    assert_eq!(secret.len(), 40);

    let stored = app.users.tokens();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.to_string(), id);
    assert_eq!(stored[0].name, DEFAULT_TOKEN_NAME);
    assert_eq!(stored[0].token_hash, hash_token(secret));
    assert_ne!(stored[0].token_hash, secret);
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let app = TestApp::new();
    app.register("ada@example.com").await;

    let hash = app.users.password_hash("ada@example.com").unwrap();
    assert_ne!(hash, PASSWORD);
    assert!(hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_is_a_validation_error() {
    let app = TestApp::new();
    app.register("ada@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({
                "name": "Someone Else",
                "email": "ada@example.com",
                "password": "another password"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"]["email"][0],
        "The email has already been taken."
    );
    assert_eq!(app.users.user_count(), 1);
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({"email": "not-an-email", "password": "short"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["errors"]["name"][0], "The name field is required.");
    assert_eq!(
        response.body["errors"]["email"][0],
        "The email field must be a valid email address."
    );
    assert_eq!(
        response.body["errors"]["password"][0],
        "The password field must be at least 8 characters."
    );
    assert_eq!(app.users.user_count(), 0);
}

#[tokio::test]
async fn mismatched_confirmation_is_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": PASSWORD,
                "password_confirmation": "something else"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"]["password"][0],
        "The password field confirmation does not match."
    );
}

#[tokio::test]
async fn login_issues_a_new_token() {
    let app = TestApp::new();
    let first = app.register("ada@example.com").await;

    let response = login(&app, "ada@example.com", PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Login successful");
    assert_eq!(response.body["user"]["email"], "ada@example.com");
    let second = response.body["token"].as_str().unwrap();
    assert_ne!(second, first);
    assert_eq!(app.users.tokens().len(), 2);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.register("ada@example.com").await;

    let response = login(&app, "ada@example.com", "wrong password").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"success": false, "message": "Invalid credentials"})
    );
    assert_eq!(app.users.tokens().len(), 1);
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let app = TestApp::new();

    let response = login(&app, "nobody@example.com", PASSWORD).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_missing_fields_is_a_validation_error() {
    let app = TestApp::new();

    let response = app
        .request(Method::POST, "/api/login", None, Some(json!({})))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["email"][0], "The email field is required.");
    assert_eq!(
        response.body["errors"]["password"][0],
        "The password field is required."
    );
}

#[tokio::test]
async fn user_endpoint_returns_caller_and_touches_token() {
    let app = TestApp::new();
    let token = app.register("ada@example.com").await;
    assert!(app.users.tokens()[0].last_used_at.is_none());

    let response = app
        .request(Method::GET, "/api/user", Some(&token), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User fetched successfully");
    assert_eq!(response.body["user"]["email"], "ada@example.com");
    assert!(app.users.tokens()[0].last_used_at.is_some());
}

#[tokio::test]
async fn logout_revokes_only_the_current_token() {
    let app = TestApp::new();
    let first = app.register("ada@example.com").await;
    let second = login(&app, "ada@example.com", PASSWORD).await.body["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = app
        .request(Method::POST, "/api/logout", Some(&first), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"success": true, "message": "Logged out successfully"})
    );

    let revoked = app
        .request(Method::GET, "/api/user", Some(&first), None)
        .await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);

    let still_valid = app
        .request(Method::GET, "/api/user", Some(&second), None)
        .await;
    assert_eq!(still_valid.status, StatusCode::OK);
}

#[tokio::test]
async fn tampered_or_malformed_tokens_are_rejected() {
    let app = TestApp::new();
    let token = app.register("ada@example.com").await;
    let (id, _) = token.split_once('|').unwrap();

    for bad in [
        format!("{id}|not-the-secret"),
        "no-separator".to_owned(),
        "abc|secret".to_owned(),
        format!("{id}|"),
    ] {
        let response = app.request(Method::GET, "/api/user", Some(&bad), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{bad}");
        assert_eq!(response.body["message"], "Unauthenticated.");
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new();

    let response = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
}
