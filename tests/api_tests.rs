// tests/api_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_then_me() {
    // Arrange
    let app = spawn_app().await;
    let token = app.register("Asha Rao", "Asha@Example.org").await;

    // Act
    let response = app
        .client
        .get(app.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "asha@example.org");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let app = spawn_app().await;

    // Act: name too short and email malformed
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "A", "email": "not-an-email", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("name").is_some());
    assert!(body["details"].get("email").is_some());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;
    app.register("First User", "same@example.org").await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Second User", "email": "SAME@example.org", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;
    app.register("Ravi Kumar", "ravi@example.org").await;

    for (email, password) in [
        ("ravi@example.org", "wrong-password"),
        ("nobody@example.org", "password123"),
    ] {
        let response = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid credentials");
    }

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": " RAVI@example.org", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/api/scores/user"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = spawn_app().await;
    let token = app.register("Plain User", "plain@example.org").await;

    for path in [
        "/api/quizzes/admin",
        "/api/blogs/admin",
        "/api/scores/admin/all",
        "/api/scores/admin/statistics",
        "/api/contact/admin",
    ] {
        let response = app
            .client
            .get(app.url(path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403, "{}", path);
    }

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&token)
        .json(&common::quiz_body(2))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
