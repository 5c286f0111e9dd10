// src/handlers/quiz.rs

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::{SUBMIT_MAX_RETRIES, SUBMIT_RETRY_BACKOFF_MS},
    error::{AppError, is_busy},
    grading::{self, QuizStats, ScoreDecision},
    models::{
        pagination::{Page, PageRequest},
        quiz::{
            CreateQuizRequest, DEFAULT_PASSING_SCORE, DEFAULT_TIME_LIMIT_MINUTES, Difficulty,
            PublicQuiz, Quiz, QuizCategory, QuizListParams, SubmitQuizRequest,
            UpdateQuizRequest, parse_category_filter, parse_difficulty_filter,
        },
        score::{ScoreRecord, SubmissionResponse},
    },
    utils::jwt::Claims,
};

const QUIZ_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.description, q.questions, q.category, q.difficulty,
        q.time_limit, q.passing_score, q.is_active, q.attempts, q.average_score,
        q.created_by, u.name AS created_by_name, q.created_at, q.updated_at
    FROM quizzes q
    LEFT JOIN users u ON u.id = q.created_by
"#;

/// Lists active quizzes, newest first, with the answer key hidden.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = list(&pool, params, true).await?;
    let Page {
        items,
        total,
        total_pages,
        current_page,
    } = page;

    Ok(Json(Page {
        items: items.into_iter().map(PublicQuiz::from).collect::<Vec<_>>(),
        total,
        total_pages,
        current_page,
    }))
}

/// Lists every quiz, inactive ones included, with answers.
/// Admin only.
pub async fn list_all_quizzes(
    State(pool): State<SqlitePool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    list(&pool, params, false).await.map(Json)
}

async fn list(
    pool: &SqlitePool,
    params: QuizListParams,
    active_only: bool,
) -> Result<Page<Quiz>, AppError> {
    let page = PageRequest::new(params.page, params.limit, 10);
    let category = parse_category_filter(params.category.as_deref())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let difficulty = parse_difficulty_filter(params.difficulty.as_deref())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM quizzes q");
    push_filters(&mut count_query, active_only, category, difficulty);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(QUIZ_SELECT);
    push_filters(&mut query, active_only, category, difficulty);
    query.push(" ORDER BY q.created_at DESC, q.id DESC LIMIT ");
    query.push_bind(page.limit);
    query.push(" OFFSET ");
    query.push_bind(page.offset());

    let quizzes = query
        .build_query_as::<Quiz>()
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Page::new(quizzes, total, page))
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    active_only: bool,
    category: Option<QuizCategory>,
    difficulty: Option<Difficulty>,
) {
    builder.push(" WHERE 1 = 1");
    if active_only {
        builder.push(" AND q.is_active = 1");
    }
    if let Some(category) = category {
        builder.push(" AND q.category = ");
        builder.push_bind(category);
    }
    if let Some(difficulty) = difficulty {
        builder.push(" AND q.difficulty = ");
        builder.push_bind(difficulty);
    }
}

/// Retrieves a single active quiz without its answer key.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_active_quiz(&pool, id).await?;

    Ok(Json(PublicQuiz::from(quiz)))
}

/// Creates a new quiz owned by the calling admin.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let created_by = claims.user_id()?;
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
        (title, description, questions, category, difficulty, time_limit, passing_score,
         created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.description.as_deref().map(str::trim).unwrap_or_default())
    .bind(SqlJson(&payload.questions))
    .bind(payload.category.unwrap_or_default())
    .bind(payload.difficulty.unwrap_or_default())
    .bind(payload.time_limit_minutes.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES))
    .bind(payload.passing_score_percent.unwrap_or(DEFAULT_PASSING_SCORE))
    .bind(created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(quiz_id = id, created_by, "Quiz created");

    let quiz = fetch_quiz(&pool, id).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates a quiz by ID. Statistics are left untouched.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    if payload.is_empty() {
        return Ok(Json(fetch_quiz(&pool, id).await?));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    separated.push("updated_at = ");
    separated.push_bind_unseparated(Utc::now());

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.trim().to_string());
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description.trim().to_string());
    }

    if let Some(questions) = payload.questions {
        separated.push("questions = ");
        separated.push_bind_unseparated(SqlJson(questions));
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(time_limit) = payload.time_limit_minutes {
        separated.push("time_limit = ");
        separated.push_bind_unseparated(time_limit);
    }

    if let Some(passing_score) = payload.passing_score_percent {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing_score);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(fetch_quiz(&pool, id).await?))
}

/// Deletes a quiz by ID. Score records for it go with it.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Grades a quiz attempt and records it.
///
/// * Rejects unknown or inactive quizzes (404) and malformed answer lists
///   (400) before touching any state.
/// * Folds the percentage into the quiz's running average.
/// * Keeps the caller's best attempt per quiz.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let user_id = claims.user_id()?;

    let quiz = fetch_active_quiz(&pool, id).await?;
    let graded = grading::grade(&quiz.questions, &req.answers)?;

    let record = ScoreRecord {
        quiz_id: quiz.id,
        score: graded.score,
        total_questions: graded.total_questions,
        percentage: graded.percentage,
        date: Utc::now(),
    };

    let decision = record_submission(&pool, user_id, &record).await?;

    tracing::info!(
        quiz_id = quiz.id,
        user_id,
        percentage = record.percentage,
        ?decision,
        "Quiz submitted"
    );

    Ok(Json(SubmissionResponse {
        passed: graded.passed(quiz.passing_score),
        score: graded.score,
        total_questions: graded.total_questions,
        percentage: graded.percentage,
        results: graded.results,
    }))
}

/// Applies a graded attempt to the quiz statistics and the user's records in
/// one transaction. Retries with a growing delay while SQLite reports the
/// database busy.
async fn record_submission(
    pool: &SqlitePool,
    user_id: i64,
    record: &ScoreRecord,
) -> Result<ScoreDecision, AppError> {
    let mut attempt = 1;
    loop {
        match try_record(pool, user_id, record).await {
            Ok(Some(decision)) => return Ok(decision),
            // The quiz was deleted or deactivated after grading
            Ok(None) => return Err(AppError::NotFound("Quiz not found".to_string())),
            Err(e) if is_busy(&e) && attempt < SUBMIT_MAX_RETRIES => {
                tracing::warn!(
                    quiz_id = record.quiz_id,
                    attempt,
                    "Database busy while recording submission, retrying"
                );
                let delay = SUBMIT_RETRY_BACKOFF_MS * u64::from(attempt);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) if is_busy(&e) => {
                tracing::error!(quiz_id = record.quiz_id, "Database stayed busy: {:?}", e);
                return Err(AppError::Conflict(
                    "Quiz is busy, please submit again".to_string(),
                ));
            }
            Err(e) => {
                tracing::error!("Failed to record quiz submission: {:?}", e);
                return Err(AppError::from(e));
            }
        }
    }
}

/// Returns `None` when the quiz is no longer active.
///
/// The statistics update is the first statement, so the transaction takes the
/// write lock up front and concurrent submissions queue on SQLite's busy
/// timeout. The mean is folded in a single statement and never read back
/// into Rust before it is written. Dropping the transaction on any early
/// return rolls it back.
async fn try_record(
    pool: &SqlitePool,
    user_id: i64,
    record: &ScoreRecord,
) -> Result<Option<ScoreDecision>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(stats) = sqlx::query_as::<_, QuizStats>(
        r#"
        UPDATE quizzes
        SET average_score = (average_score * attempts + ?) / (attempts + 1),
            attempts = attempts + 1
        WHERE id = ? AND is_active = 1
        RETURNING attempts, average_score
        "#,
    )
    .bind(record.percentage as f64)
    .bind(record.quiz_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    tracing::debug!(
        quiz_id = record.quiz_id,
        attempts = stats.attempts,
        average_score = stats.average_score,
        "Quiz statistics updated"
    );

    let existing = sqlx::query_as::<_, ScoreRecord>(
        r#"
        SELECT quiz_id, score, total_questions, percentage, taken_at AS date
        FROM quiz_scores
        WHERE user_id = ? AND quiz_id = ?
        "#,
    )
    .bind(user_id)
    .bind(record.quiz_id)
    .fetch_optional(&mut *tx)
    .await?;

    let decision = grading::decide(existing.as_ref(), record);

    match decision {
        ScoreDecision::Insert => {
            sqlx::query(
                r#"
                INSERT INTO quiz_scores (user_id, quiz_id, score, total_questions, percentage, taken_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(record.quiz_id)
            .bind(record.score)
            .bind(record.total_questions)
            .bind(record.percentage)
            .bind(record.date)
            .execute(&mut *tx)
            .await?;
        }
        ScoreDecision::Replace => {
            sqlx::query(
                r#"
                UPDATE quiz_scores
                SET score = ?, total_questions = ?, percentage = ?, taken_at = ?
                WHERE user_id = ? AND quiz_id = ?
                "#,
            )
            .bind(record.score)
            .bind(record.total_questions)
            .bind(record.percentage)
            .bind(record.date)
            .bind(user_id)
            .bind(record.quiz_id)
            .execute(&mut *tx)
            .await?;
        }
        ScoreDecision::Discard => {}
    }

    tx.commit().await?;
    Ok(Some(decision))
}

async fn fetch_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(&format!("{QUIZ_SELECT} WHERE q.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Inactive quizzes are indistinguishable from missing ones.
async fn fetch_active_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    let quiz = fetch_quiz(pool, id).await?;
    if !quiz.is_active {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(quiz)
}
