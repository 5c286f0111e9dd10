// tests/blog_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

fn long_content() -> String {
    "<p>The Preamble declares India a sovereign, socialist, secular, democratic republic.</p>"
        .repeat(5)
}

async fn create_blog(app: &common::TestApp, admin: &str, body: Value) -> Value {
    let response = app
        .client
        .post(app.url("/api/blogs"))
        .bearer_auth(admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn blog_lifecycle() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let blog = create_blog(
        &app,
        &admin,
        json!({
            "title": "Reading the Preamble",
            "content": format!("{}<script>alert(1)</script>", long_content()),
            "category": "Constitutional History",
            "tags": [" preamble ", ""]
        }),
    )
    .await;
    let id = blog["id"].as_i64().unwrap();

    assert!(!blog["content"].as_str().unwrap().contains("<script>"));
    assert!(blog["excerpt"].as_str().unwrap().ends_with("..."));
    assert_eq!(blog["tags"], json!(["preamble"]));
    assert_eq!(blog["authorName"], "Site Admin");
    assert_eq!(blog["isPublished"], true);

    // Reading counts a view.
    let read: Value = app
        .client
        .get(app.url(&format!("/api/blogs/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(read["views"], 1);

    let list: Value = app
        .client
        .get(app.url("/api/blogs?category=Constitutional History"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 1);

    let list: Value = app
        .client
        .get(app.url("/api/blogs?category=Amendments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 0);

    let response = app
        .client
        .put(app.url(&format!("/api/blogs/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Reading the Preamble again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Reading the Preamble again");
    assert_eq!(updated["excerpt"], blog["excerpt"]);

    let response = app
        .client
        .delete(app.url(&format!("/api/blogs/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/blogs/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn drafts_are_admin_only() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let draft = create_blog(
        &app,
        &admin,
        json!({
            "title": "Unfinished thoughts",
            "content": long_content(),
            "excerpt": "Coming soon",
            "isPublished": false
        }),
    )
    .await;
    let id = draft["id"].as_i64().unwrap();
    assert_eq!(draft["excerpt"], "Coming soon");
    assert_eq!(draft["category"], "General");

    let response = app
        .client
        .get(app.url(&format!("/api/blogs/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let public: Value = app
        .client
        .get(app.url("/api/blogs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["total"], 0);

    let all: Value = app
        .client
        .get(app.url("/api/blogs/admin"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["total"], 1);
}

#[tokio::test]
async fn likes_need_login() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.register("Reader", "reader@example.org").await;

    let blog = create_blog(
        &app,
        &admin,
        json!({ "title": "On fundamental duties", "content": long_content() }),
    )
    .await;
    let like_url = app.url(&format!("/api/blogs/{}/like", blog["id"]));

    let response = app.client.post(&like_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    for expected in 1..=2 {
        let body: Value = app
            .client
            .post(&like_url)
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["likes"], expected);
    }
}

#[tokio::test]
async fn short_content_is_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/api/blogs"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Too short", "content": "Tiny.", "imageUrl": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("content").is_some());
    assert!(body["details"].get("imageUrl").is_some() || body["details"].get("image_url").is_some());
}
