// src/handlers/contact.rs

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        contact::{
            Contact, ContactListParams, ContactStatus, CreateContactRequest, DEFAULT_SUBJECT,
            UpdateContactStatusRequest,
        },
        pagination::{Page, PageRequest},
        quiz::parse_enum_filter,
    },
};

const CONTACT_COLUMNS: &str =
    "id, name, email, subject, message, status, is_read, reply, replied_at, created_at";

/// Stores a message from the public contact form.
pub async fn create_contact(
    State(pool): State<SqlitePool>,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let payload = payload.normalized();
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO contacts (name, email, subject, message, status, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(payload.subject.as_deref().unwrap_or(DEFAULT_SUBJECT))
    .bind(&payload.message)
    .bind(ContactStatus::New)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store contact message: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(contact_id = id, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Thank you for your message. We will get back to you soon.",
            "contactId": id,
        })),
    ))
}

/// Lists inbox messages, newest first.
/// Admin only.
pub async fn list_contacts(
    State(pool): State<SqlitePool>,
    Query(params): Query<ContactListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(params.page, params.limit, 20);
    let status = parse_enum_filter::<ContactStatus>(params.status.as_deref())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM contacts");
    push_status_filter(&mut count_query, status);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(&pool)
        .await?;

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
    push_status_filter(&mut query, status);
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(page.limit);
    query.push(" OFFSET ");
    query.push_bind(page.offset());

    let contacts = query
        .build_query_as::<Contact>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list contacts: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(Page::new(contacts, total, page)))
}

fn push_status_filter(builder: &mut QueryBuilder<'_, Sqlite>, status: Option<ContactStatus>) {
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
}

/// Admin only.
pub async fn get_contact(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_contact(&pool, id).await?))
}

/// Moves a message through the inbox workflow, optionally recording a reply.
/// Admin only.
pub async fn update_contact_status(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateContactStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let reply = payload
        .reply
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE contacts SET ");
    let mut separated = builder.separated(", ");

    separated.push("status = ");
    separated.push_bind_unseparated(payload.status);
    separated.push("is_read = ");
    separated.push_bind_unseparated(payload.status.is_read());

    if let Some(reply) = reply {
        separated.push("reply = ");
        separated.push_bind_unseparated(reply);
        separated.push("replied_at = ");
        separated.push_bind_unseparated(Utc::now());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update contact: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Contact message not found".to_string()));
    }

    Ok(Json(fetch_contact(&pool, id).await?))
}

/// Admin only.
pub async fn delete_contact(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Contact message not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_contact(pool: &SqlitePool, id: i64) -> Result<Contact, AppError> {
    sqlx::query_as::<_, Contact>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Contact message not found".to_string()))
}
