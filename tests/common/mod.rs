//! Shared helpers for the HTTP API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use folio::web::middleware::RateLimitState;
use folio::web::{create_router, AppState};
use folio::{Config, Database, Role, UserRepository, UserUpdate};
use serde_json::{json, Value};

pub const TEST_PASSWORD: &str = "password123";

/// Create a test configuration with limits high enough to never trip.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.environment = "test".to_string();
    config.auth.jwt_secret = "test-secret-key-for-testing-only-0123456789".to_string();
    config.rate_limit.window_secs = 900;
    config.rate_limit.max_requests = 10_000;
    config.rate_limit.login_per_minute = 1_000;
    config
}

/// Create a test server over an in-memory database.
pub async fn create_test_server() -> (TestServer, Database) {
    create_test_server_with(create_test_config()).await
}

pub async fn create_test_server_with(config: Config) -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let limits = Arc::new(RateLimitState::from_config(&config.rate_limit));
    let state = Arc::new(AppState::new(db.clone(), config).expect("Failed to build state"));
    let server = TestServer::new(create_router(state, limits)).expect("Failed to create test server");
    (server, db)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A registered account.
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Register `username` with email `<username>@example.com`.
pub async fn register_user(server: &TestServer, username: &str) -> TestUser {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": TEST_PASSWORD,
            "fullName": format!("{username} tester"),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    TestUser {
        id: body["data"]["user"]["id"].as_i64().unwrap(),
        username: username.to_string(),
        token: body["data"]["token"].as_str().unwrap().to_string(),
    }
}

/// Register a user and promote them to admin.
pub async fn register_admin(server: &TestServer, db: &Database, username: &str) -> TestUser {
    let user = register_user(server, username).await;
    UserRepository::new(db.pool())
        .update(user.id, &UserUpdate::new().role(Role::Admin))
        .await
        .unwrap();
    user
}

/// Create a category as `admin`; returns its slug.
pub async fn create_category(server: &TestServer, admin: &TestUser, name: &str) -> String {
    let response = server
        .post("/api/categories")
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .json(&json!({
            "name": name,
            "description": format!("All about {name}"),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["data"]["slug"].as_str().unwrap().to_string()
}

/// Create a post as `author`; returns the post JSON.
pub async fn create_post(
    server: &TestServer,
    author: &TestUser,
    category: &str,
    title: &str,
    status: &str,
) -> Value {
    let response = server
        .post("/api/posts")
        .add_header(AUTHORIZATION, bearer(&author.token))
        .json(&json!({
            "title": title,
            "content": "A body that is comfortably longer than ten characters.",
            "category": category,
            "tags": ["Rust", "web"],
            "status": status,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["data"]["post"].clone()
}
