//! Web API Category and Contact Tests

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, create_category, create_post, create_test_server, register_admin, register_user};
use serde_json::{json, Value};

// ============================================================================
// Category Tests
// ============================================================================

#[tokio::test]
async fn test_category_lifecycle() {
    let (server, db) = create_test_server().await;
    let admin = register_admin(&server, &db, "admin").await;

    let slug = create_category(&server, &admin, "Web Development").await;
    assert_eq!(slug, "web-development");

    let body: Value = server.get("/api/categories").await.json();
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    let id = categories[0]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/categories/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .json(&json!({ "description": "Frontend and backend" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["description"], "Frontend and backend");
    assert_eq!(body["data"]["name"], "Web Development");

    server
        .delete(&format!("/api/categories/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status_ok();

    server
        .delete(&format!("/api/categories/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_category_conflicts() {
    let (server, db) = create_test_server().await;
    let admin = register_admin(&server, &db, "admin").await;
    create_category(&server, &admin, "Travel").await;

    server
        .post("/api/categories")
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .json(&json!({ "name": "Travel", "description": "Again" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let (server, db) = create_test_server().await;
    let admin = register_admin(&server, &db, "admin").await;
    let slug = create_category(&server, &admin, "Technology").await;
    create_post(&server, &admin, &slug, "Pinned", "published").await;

    let body: Value = server.get("/api/categories").await.json();
    let id = body["data"][0]["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/categories/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_category_mutation_is_admin_only() {
    let (server, _db) = create_test_server().await;
    let alice = register_user(&server, "alice").await;

    server
        .post("/api/categories")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .json(&json!({ "name": "Mine", "description": "Not allowed" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .post("/api/categories")
        .json(&json!({ "name": "Mine", "description": "Not allowed" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Contact Tests
// ============================================================================

#[tokio::test]
async fn test_contact_submit_and_manage() {
    let (server, db) = create_test_server().await;
    let admin = register_admin(&server, &db, "admin").await;

    let response = server
        .post("/api/contact")
        .json(&json!({
            "name": "Zed Reader",
            "email": "Zed@Example.com",
            "message": "Loved the last post."
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "zed@example.com");
    let id = body["data"]["id"].as_i64().unwrap();

    server
        .post("/api/contact")
        .json(&json!({
            "name": "Amy Reader",
            "email": "amy@example.com",
            "message": "Typo in paragraph two."
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server
        .get("/api/contact?sort=name&order=asc")
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .json();
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert_eq!(body["data"]["contacts"][0]["name"], "Amy Reader");

    let response = server
        .put(&format!("/api/contact/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .json(&json!({ "message": "Loved the last two posts." }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Loved the last two posts.");
    assert_eq!(body["data"]["name"], "Zed Reader");

    server
        .delete(&format!("/api/contact/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status_ok();

    server
        .get(&format!("/api/contact/{id}"))
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_validation() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/contact")
        .json(&json!({ "name": "", "email": "nope", "message": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let errors = body["errors"].as_array().unwrap();
    for field in ["name", "email", "message"] {
        assert!(errors.iter().any(|e| e["field"] == field), "missing error for {field}");
    }
}

#[tokio::test]
async fn test_contact_inbox_is_admin_only() {
    let (server, db) = create_test_server().await;
    let admin = register_admin(&server, &db, "admin").await;
    let alice = register_user(&server, "alice").await;

    server
        .get("/api/contact")
        .add_header(AUTHORIZATION, bearer(&alice.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .get("/api/contact?sort=phone")
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/contact/abc")
        .add_header(AUTHORIZATION, bearer(&admin.token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid contact ID");
}

// ============================================================================
// Misc Tests
// ============================================================================

#[tokio::test]
async fn test_health_and_unknown_route() {
    let (server, _db) = create_test_server().await;

    let body: Value = server.get("/api/health").await.json();
    assert_eq!(body["message"], "Blog API is running");
    assert_eq!(body["data"]["status"], "OK");

    let response = server.get("/api/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_image_upload_requires_auth() {
    let (server, _db) = create_test_server().await;

    server
        .post("/api/image/upload")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
