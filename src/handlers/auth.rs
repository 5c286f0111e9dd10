// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{AuthResponse, LoginRequest, ROLE_USER, RegisterRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

/// Registers a new user and logs them in.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a token and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password, role, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(&email)
    .bind(hashed_password)
    .bind(ROLE_USER)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("User with email '{}' already exists", email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "User registered");

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the email and password against the database.
/// Unknown email and wrong password get the same answer.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(AuthResponse { token, user }))
}

/// Returns the currently authenticated user.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, claims.user_id()?).await?;

    Ok(Json(json!({ "user": user })))
}

/// Loads a user by id, 404 when it no longer exists.
pub(crate) async fn find_user(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}
