// src/models/contact.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_SUBJECT: &str = "General Inquiry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
    Closed,
}

impl ContactStatus {
    /// Anything past `New` counts as read.
    pub fn is_read(self) -> bool {
        self != ContactStatus::New
    }
}

/// Represents the 'contacts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub is_read: bool,
    pub reply: Option<String>,
    pub replied_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for the public contact form.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(max = 200, message = "Subject cannot be more than 200 characters"))]
    pub subject: Option<String>,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Message must be between 10 and 1000 characters"
    ))]
    pub message: String,
}

impl CreateContactRequest {
    /// Trims text fields and lowercases the email, as stored.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            subject: self
                .subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message: self.message.trim().to_string(),
        }
    }
}

/// DTO for moving a message through the inbox workflow.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContactStatusRequest {
    pub status: ContactStatus,
    #[validate(length(max = 1000, message = "Reply cannot be more than 1000 characters"))]
    pub reply: Option<String>,
}

/// Query parameters for the admin inbox.
#[derive(Debug, Deserialize)]
pub struct ContactListParams {
    /// Status name, or "all".
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
