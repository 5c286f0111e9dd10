// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    grading::QuestionResult,
    models::quiz::{Difficulty, QuizCategory},
};

/// A user's best attempt at one quiz ('quiz_scores' table).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    /// Rounded, 0..=100.
    pub percentage: i64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// Score record joined with the quiz it belongs to.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserScoreEntry {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// Returned to the caller after a quiz submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub passed: bool,
    pub results: Vec<QuestionResult>,
}

/// One row of a quiz leaderboard.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub name: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

/// Query parameters for the admin score listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminScoreParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Only users holding a record for this quiz.
    pub quiz_id: Option<i64>,
}

/// Score record with its quiz title, keyed by owner for the admin listing.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnedScoreEntry {
    #[serde(skip)]
    pub user_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// A user and all their records, for the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScores {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub quiz_scores: Vec<OwnedScoreEntry>,
}

/// Per-quiz row of the admin statistics.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatistics {
    pub id: i64,
    pub title: String,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    pub attempts: i64,
    pub average_score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_quizzes: i64,
    pub total_users: i64,
    pub users_with_scores: i64,
    pub total_quiz_attempts: i64,
    pub quizzes: Vec<QuizStatistics>,
}
