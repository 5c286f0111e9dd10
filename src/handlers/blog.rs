// src/handlers/blog.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        blog::{
            Blog, BlogCategory, BlogListParams, CreateBlogRequest, UpdateBlogRequest,
            default_excerpt, normalize_tags,
        },
        pagination::{Page, PageRequest},
        quiz::parse_enum_filter,
    },
    utils::{html::clean_html, jwt::Claims},
};

const BLOG_SELECT: &str = r#"
    SELECT
        b.id, b.title, b.content, b.excerpt, b.image_url, b.category, b.tags,
        b.author_id, u.name AS author_name,
        b.is_published, b.views, b.likes, b.created_at, b.updated_at
    FROM blogs b
    LEFT JOIN users u ON u.id = b.author_id
"#;

/// Lists published blogs, newest first.
pub async fn list_blogs(
    State(pool): State<SqlitePool>,
    Query(params): Query<BlogListParams>,
) -> Result<impl IntoResponse, AppError> {
    list(&pool, params, true).await.map(Json)
}

/// Lists every blog including drafts.
/// Admin only.
pub async fn list_all_blogs(
    State(pool): State<SqlitePool>,
    Query(params): Query<BlogListParams>,
) -> Result<impl IntoResponse, AppError> {
    list(&pool, params, false).await.map(Json)
}

async fn list(
    pool: &SqlitePool,
    params: BlogListParams,
    published_only: bool,
) -> Result<Page<Blog>, AppError> {
    let page = PageRequest::new(params.page, params.limit, 10);
    let category = parse_enum_filter::<BlogCategory>(params.category.as_deref())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM blogs b");
    push_filters(&mut count_query, published_only, category);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(BLOG_SELECT);
    push_filters(&mut query, published_only, category);
    query.push(" ORDER BY b.created_at DESC, b.id DESC LIMIT ");
    query.push_bind(page.limit);
    query.push(" OFFSET ");
    query.push_bind(page.offset());

    let blogs = query.build_query_as::<Blog>().fetch_all(pool).await.map_err(|e| {
        tracing::error!("Failed to list blogs: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Page::new(blogs, total, page))
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    published_only: bool,
    category: Option<BlogCategory>,
) {
    builder.push(" WHERE 1 = 1");
    if published_only {
        builder.push(" AND b.is_published = 1");
    }
    if let Some(category) = category {
        builder.push(" AND b.category = ");
        builder.push_bind(category);
    }
}

/// Retrieves a single published blog and counts the view.
pub async fn get_blog(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE blogs SET views = views + 1 WHERE id = ? AND is_published = 1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }

    let blog = fetch_blog(&pool, id).await?;

    Ok(Json(blog))
}

/// Adds a like and returns the new count.
pub async fn like_blog(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let likes: i64 = sqlx::query_scalar(
        "UPDATE blogs SET likes = likes + 1 WHERE id = ? AND is_published = 1 RETURNING likes",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(json!({ "likes": likes })))
}

/// Creates a new blog post authored by the calling admin.
/// Admin only.
pub async fn create_blog(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateBlogRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let author_id = claims.user_id()?;
    let content = clean_html(&payload.content);
    let excerpt = payload
        .excerpt
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| default_excerpt(&content));
    let tags = normalize_tags(payload.tags.unwrap_or_default());
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO blogs
        (title, content, excerpt, image_url, category, tags, author_id, is_published, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.title.trim())
    .bind(content)
    .bind(excerpt)
    .bind(payload.image_url.unwrap_or_default())
    .bind(payload.category.unwrap_or_default())
    .bind(SqlJson(tags))
    .bind(author_id)
    .bind(payload.is_published.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create blog: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(blog_id = id, author_id, "Blog created");

    let blog = fetch_blog(&pool, id).await?;

    Ok((StatusCode::CREATED, Json(blog)))
}

/// Updates a blog post by ID.
/// Admin only.
pub async fn update_blog(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateBlogRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE blogs SET ");
    let mut separated = builder.separated(", ");

    separated.push("updated_at = ");
    separated.push_bind_unseparated(Utc::now());

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.trim().to_string());
    }

    // New content without an explicit excerpt regenerates the excerpt.
    match (payload.content, payload.excerpt) {
        (Some(content), excerpt) => {
            let content = clean_html(&content);
            let excerpt = excerpt
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| default_excerpt(&content));
            separated.push("content = ");
            separated.push_bind_unseparated(content);
            separated.push("excerpt = ");
            separated.push_bind_unseparated(excerpt);
        }
        (None, Some(excerpt)) => {
            separated.push("excerpt = ");
            separated.push_bind_unseparated(excerpt);
        }
        (None, None) => {}
    }

    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(tags) = payload.tags {
        separated.push("tags = ");
        separated.push_bind_unseparated(SqlJson(normalize_tags(tags)));
    }

    if let Some(is_published) = payload.is_published {
        separated.push("is_published = ");
        separated.push_bind_unseparated(is_published);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update blog: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }

    let blog = fetch_blog(&pool, id).await?;

    Ok(Json(blog))
}

/// Deletes a blog post by ID.
/// Admin only.
pub async fn delete_blog(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete blog: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_blog(pool: &SqlitePool, id: i64) -> Result<Blog, AppError> {
    sqlx::query_as::<_, Blog>(&format!("{BLOG_SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))
}
