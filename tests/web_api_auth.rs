//! Web API Authentication Tests
//!
//! Integration tests for registration, login, logout and profile endpoints.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, create_test_server, register_user, TEST_PASSWORD};
use folio::{UserRepository, UserUpdate};
use serde_json::{json, Value};

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "Alice@Example.com",
            "password": TEST_PASSWORD,
            "fullName": "Alice Liddell",
            "bio": "Writes about rabbits"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["fullName"], "Alice Liddell");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_and_username() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": TEST_PASSWORD,
            "fullName": "Another Alice"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "username"]);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "bad name!",
            "email": "not-an-email",
            "password": "short",
            "fullName": "A"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().unwrap();
    for field in ["username", "email", "password", "fullName"] {
        assert!(
            errors.iter().any(|e| e["field"] == field),
            "missing error for {field}"
        );
    }
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "ALICE@example.com",
            "password": TEST_PASSWORD
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], "Login successful");
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"]["lastLogin"].is_string());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "wrong-password"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": TEST_PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_deactivated_account() {
    let (server, db) = create_test_server().await;
    let alice = register_user(&server, "alice").await;
    UserRepository::new(db.pool())
        .update(alice.id, &UserUpdate::new().is_active(false))
        .await
        .unwrap();

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": TEST_PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Account is deactivated");

    // Existing tokens stop working too
    server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_me_requires_token() {
    let (server, _db) = create_test_server().await;

    let response = server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["message"], "Access denied. No token provided.");
}

#[tokio::test]
async fn test_me_with_invalid_token() {
    let (server, _db) = create_test_server().await;

    server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, "Bearer invalid-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (server, _db) = create_test_server().await;
    let alice = register_user(&server, "alice").await;

    server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/auth/logout")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Logout successfully");

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Token has been revoked.");

    // A fresh login gets a new, working token
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": TEST_PASSWORD
        }))
        .await;
    let body: Value = response.json();
    let token = body["data"]["token"].as_str().unwrap();
    assert_ne!(token, alice.token);

    server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(token))
        .await
        .assert_status_ok();
}

// ============================================================================
// Profile Tests
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let (server, _db) = create_test_server().await;
    let alice = register_user(&server, "alice").await;

    let response = server
        .put("/api/auth/profile")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .json(&json!({
            "fullName": "Alice In Wonderland",
            "bio": "Curiouser and curiouser"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["data"]["user"]["fullName"], "Alice In Wonderland");
    assert_eq!(body["data"]["user"]["bio"], "Curiouser and curiouser");
}

#[tokio::test]
async fn test_change_password() {
    let (server, _db) = create_test_server().await;
    let alice = register_user(&server, "alice").await;

    let response = server
        .put("/api/auth/change-password")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .json(&json!({
            "currentPassword": "not-my-password",
            "newPassword": "newpassword456"
        }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    server
        .put("/api/auth/change-password")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .json(&json!({
            "currentPassword": TEST_PASSWORD,
            "newPassword": "newpassword456"
        }))
        .await
        .assert_status_ok();

    server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": TEST_PASSWORD }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "newpassword456" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_google_login_unconfigured() {
    let (server, _db) = create_test_server().await;

    server
        .get("/api/auth/google")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}
