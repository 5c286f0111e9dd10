// src/models/blog.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

pub const EXCERPT_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum BlogCategory {
    #[serde(rename = "Fundamental Rights")]
    #[sqlx(rename = "Fundamental Rights")]
    FundamentalRights,
    #[serde(rename = "Fundamental Duties")]
    #[sqlx(rename = "Fundamental Duties")]
    FundamentalDuties,
    #[serde(rename = "Directive Principles")]
    #[sqlx(rename = "Directive Principles")]
    DirectivePrinciples,
    #[serde(rename = "Constitutional History")]
    #[sqlx(rename = "Constitutional History")]
    ConstitutionalHistory,
    Amendments,
    #[default]
    General,
}

/// Represents the 'blogs' table, joined with the author's name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub title: String,
    /// Sanitized HTML.
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    pub category: BlogCategory,
    pub tags: Json<Vec<String>>,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub is_published: bool,
    pub views: i64,
    pub likes: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new blog post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: String,
    #[validate(length(min = 100, message = "Content must be at least 100 characters"))]
    pub content: String,
    #[validate(length(max = 300, message = "Excerpt cannot be more than 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(custom(function = validate_image_url))]
    pub image_url: Option<String>,
    pub category: Option<BlogCategory>,
    #[validate(custom(function = validate_tags))]
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// DTO for updating a blog post. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: Option<String>,
    #[validate(length(min = 100, message = "Content must be at least 100 characters"))]
    pub content: Option<String>,
    #[validate(length(max = 300, message = "Excerpt cannot be more than 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(custom(function = validate_image_url))]
    pub image_url: Option<String>,
    pub category: Option<BlogCategory>,
    #[validate(custom(function = validate_tags))]
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Query parameters for listing blogs.
#[derive(Debug, Deserialize)]
pub struct BlogListParams {
    /// Category name, or "all".
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Empty means "no image"; anything else must be an absolute URL.
fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    if url.len() > 500 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), validator::ValidationError> {
    if tags.len() > 20 {
        return Err(validator::ValidationError::new("too_many_tags"));
    }
    for tag in tags {
        if tag.len() > 50 {
            return Err(validator::ValidationError::new("tag_too_long"));
        }
    }
    Ok(())
}

/// Trims tags and drops empty ones.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// First `EXCERPT_MAX_CHARS` characters of `content` followed by "...".
pub fn default_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(EXCERPT_MAX_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}
