// src/handlers/score.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    handlers::auth::find_user,
    models::{
        pagination::{Page, PageRequest},
        score::{
            AdminScoreParams, LeaderboardEntry, LeaderboardParams, OwnedScoreEntry,
            QuizStatistics, ScoreRecord, Statistics, UserScoreEntry, UserScores,
        },
    },
    utils::jwt::Claims,
};

const DEFAULT_LEADERBOARD_SIZE: i64 = 10;
const MAX_LEADERBOARD_SIZE: i64 = 100;

/// Returns every best-score record of the calling user, newest first.
pub async fn user_scores(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, claims.user_id()?).await?;

    let scores = sqlx::query_as::<_, UserScoreEntry>(
        r#"
        SELECT
            s.quiz_id, q.title AS quiz_title, q.category, q.difficulty,
            s.score, s.total_questions, s.percentage, s.taken_at AS date
        FROM quiz_scores s
        JOIN quizzes q ON q.id = s.quiz_id
        WHERE s.user_id = ?
        ORDER BY s.taken_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch user scores: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({
        "userId": user.id,
        "name": user.name,
        "quizScores": scores,
    })))
}

/// The calling user's record for one quiz, `null` when they have none.
pub async fn quiz_score(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let record = sqlx::query_as::<_, ScoreRecord>(
        r#"
        SELECT quiz_id, score, total_questions, percentage, taken_at AS date
        FROM quiz_scores
        WHERE user_id = ? AND quiz_id = ?
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(json!({ "quizScore": record })))
}

/// Top scorers of a quiz. Zero-percent records are left out.
pub async fn leaderboard(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE);

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            u.id AS user_id, u.name,
            s.score, s.total_questions, s.percentage, s.taken_at AS date
        FROM quiz_scores s
        JOIN users u ON u.id = s.user_id
        WHERE s.quiz_id = ? AND s.percentage > 0
        ORDER BY s.percentage DESC, s.taken_at ASC
        LIMIT ?
        "#,
    )
    .bind(quiz_id)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(entries))
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Pages through users together with all their records.
/// Admin only.
pub async fn all_scores(
    State(pool): State<SqlitePool>,
    Query(params): Query<AdminScoreParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(params.page, params.limit, 20);

    let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM users u");
    push_quiz_filter(&mut count_query, params.quiz_id);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(&pool)
        .await?;

    let mut users_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT u.id, u.name, u.email, u.created_at FROM users u");
    push_quiz_filter(&mut users_query, params.quiz_id);
    users_query.push(" ORDER BY u.created_at DESC, u.id DESC LIMIT ");
    users_query.push_bind(page.limit);
    users_query.push(" OFFSET ");
    users_query.push_bind(page.offset());

    let users = users_query
        .build_query_as::<UserRow>()
        .fetch_all(&pool)
        .await?;

    let mut by_user: HashMap<i64, Vec<OwnedScoreEntry>> = HashMap::new();
    if !users.is_empty() {
        let mut scores_query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                s.user_id, s.quiz_id, q.title AS quiz_title, q.category, q.difficulty,
                s.score, s.total_questions, s.percentage, s.taken_at AS date
            FROM quiz_scores s
            JOIN quizzes q ON q.id = s.quiz_id
            WHERE s.user_id IN (
            "#,
        );
        let mut ids = scores_query.separated(", ");
        for user in &users {
            ids.push_bind(user.id);
        }
        ids.push_unseparated(")");
        if let Some(quiz_id) = params.quiz_id {
            scores_query.push(" AND s.quiz_id = ");
            scores_query.push_bind(quiz_id);
        }
        scores_query.push(" ORDER BY s.taken_at DESC");

        let scores = scores_query
            .build_query_as::<OwnedScoreEntry>()
            .fetch_all(&pool)
            .await?;

        for score in scores {
            by_user.entry(score.user_id).or_default().push(score);
        }
    }

    let items = users
        .into_iter()
        .map(|user| UserScores {
            quiz_scores: by_user.remove(&user.id).unwrap_or_default(),
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        })
        .collect();

    Ok(Json(Page::new(items, total, page)))
}

fn push_quiz_filter(builder: &mut QueryBuilder<'_, Sqlite>, quiz_id: Option<i64>) {
    if let Some(quiz_id) = quiz_id {
        builder.push(
            " WHERE EXISTS (SELECT 1 FROM quiz_scores s WHERE s.user_id = u.id AND s.quiz_id = ",
        );
        builder.push_bind(quiz_id);
        builder.push(")");
    }
}

/// Site-wide totals plus per-quiz attempt statistics. Quiz counts, the
/// per-quiz list and `totalQuizAttempts` cover active quizzes only.
/// Admin only.
pub async fn statistics(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let total_quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE is_active = 1")
        .fetch_one(&pool)
        .await?;
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;
    let users_with_scores: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM quiz_scores")
            .fetch_one(&pool)
            .await?;

    let quizzes = sqlx::query_as::<_, QuizStatistics>(
        r#"
        SELECT id, title, category, difficulty, attempts, average_score, created_at
        FROM quizzes
        WHERE is_active = 1
        ORDER BY attempts DESC, id ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let total_quiz_attempts = quizzes.iter().map(|q| q.attempts).sum();

    Ok(Json(Statistics {
        total_quizzes,
        total_users,
        users_with_scores,
        total_quiz_attempts,
        quizzes,
    }))
}
