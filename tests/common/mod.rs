// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use civic_learn::{config::Config, db, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const ADMIN_EMAIL: &str = "admin@civic.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub pool: SqlitePool,
}

/// Spawns the app on a random port against a fresh in-memory database
/// with a seeded admin account.
pub async fn spawn_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    spawn_app_with("sqlite::memory:", 1).await
}

/// Spawns the app against `database_url` with a pool of `max_connections`.
pub async fn spawn_app_with(database_url: &str, max_connections: u32) -> TestApp {
    let pool = db::connect(database_url, max_connections)
        .await
        .expect("Failed to open database");

    db::migrate(&pool).await.expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origins: vec!["http://localhost:3000".to_string()],
        admin_name: Some("Site Admin".to_string()),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    db::seed_admin(&pool, &config)
        .await
        .expect("Failed to seed admin");

    let state = AppState::new(pool.clone(), config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        pool,
    }
}

/// A database file under the system temp dir, removed with its WAL
/// companions on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "civic-learn-{}-{}-{}.db",
            name,
            std::process::id(),
            nanos
        ));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user and returns their token.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": "password123" }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn admin_token(&self) -> String {
        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Admin login failed")
            .json()
            .await
            .unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    /// Creates a quiz whose i-th question has correct answer `i % 4`.
    /// Returns the new quiz id.
    pub async fn create_quiz(&self, admin_token: &str, question_count: usize) -> i64 {
        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .bearer_auth(admin_token)
            .json(&quiz_body(question_count))
            .send()
            .await
            .expect("Create quiz failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().expect("Quiz id not found")
    }

    pub async fn submit(&self, token: &str, quiz_id: i64, answers: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quizzes/{}/submit", quiz_id)))
            .bearer_auth(token)
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .expect("Submit failed")
    }

    /// `(attempts, average_score)` straight from the database.
    pub async fn quiz_stats(&self, quiz_id: i64) -> (i64, f64) {
        sqlx::query_as("SELECT attempts, average_score FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await
            .expect("Quiz not found")
    }

    pub async fn score_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_scores")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub fn quiz_body(question_count: usize) -> Value {
    let questions: Vec<Value> = (0..question_count)
        .map(|i| {
            json!({
                "text": format!("Which option is right for question {}?", i),
                "options": ["First", "Second", "Third", "Fourth"],
                "correctAnswer": i % 4,
                "explanation": "Numbered by position."
            })
        })
        .collect();

    json!({
        "title": "Constitution basics",
        "description": "A short warm-up quiz.",
        "questions": questions,
        "category": "Amendments",
        "difficulty": "Easy",
        "timeLimitMinutes": 10,
        "passingScorePercent": 60
    })
}

/// Answers where the first `correct` questions are right and the rest wrong.
pub fn answers(question_count: usize, correct: usize) -> Value {
    let answers: Vec<Value> = (0..question_count)
        .map(|i| {
            let right = i % 4;
            if i < correct {
                json!(right)
            } else {
                json!((right + 1) % 4)
            }
        })
        .collect();
    Value::Array(answers)
}
