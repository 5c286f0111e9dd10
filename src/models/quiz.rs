// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

pub const DEFAULT_TIME_LIMIT_MINUTES: i64 = 30;
pub const DEFAULT_PASSING_SCORE: i64 = 60;

/// Topic a quiz belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum QuizCategory {
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
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A single multiple-choice question. Owned by its quiz and stored inline
/// as part of the quiz's `questions` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_correct_answer))]
pub struct Question {
    #[serde(alias = "questionText")]
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Question text must be between 10 and 1000 characters"
    ))]
    pub text: String,

    #[validate(
        length(min = 2, max = 4, message = "Each question must have 2-4 options"),
        custom(function = validate_options)
    )]
    pub options: Vec<String>,

    /// 0-based index into `options`.
    pub correct_answer: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

fn validate_correct_answer(question: &Question) -> Result<(), validator::ValidationError> {
    if question.correct_answer >= question.options.len() {
        return Err(validator::ValidationError::new("correct_answer_out_of_range")
            .with_message("Correct answer must be a valid option index".into()));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Represents the 'quizzes' table, joined with the creator's name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions: Json<Vec<Question>>,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    #[serde(rename = "timeLimitMinutes")]
    pub time_limit: i64,
    /// Minimum percentage needed to pass.
    #[serde(rename = "passingScorePercent")]
    pub passing_score: i64,
    pub is_active: bool,
    pub attempts: i64,
    pub average_score: f64,
    pub created_by: i64,
    pub created_by_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Question as shown to quiz takers: no answer key, no explanation.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub text: String,
    pub options: Vec<String>,
}

/// DTO for sending a quiz to takers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
    pub question_count: usize,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    pub time_limit_minutes: i64,
    pub passing_score_percent: i64,
    pub attempts: i64,
    pub average_score: f64,
    pub created_by_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        let questions: Vec<PublicQuestion> = quiz
            .questions
            .0
            .into_iter()
            .map(|q| PublicQuestion {
                text: q.text,
                options: q.options,
            })
            .collect();

        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            question_count: questions.len(),
            questions,
            category: quiz.category,
            difficulty: quiz.difficulty,
            time_limit_minutes: quiz.time_limit,
            passing_score_percent: quiz.passing_score,
            attempts: quiz.attempts,
            average_score: quiz.average_score,
            created_by_name: quiz.created_by_name,
            created_at: quiz.created_at,
        }
    }
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: String,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    #[validate(
        length(min = 1, message = "At least one question is required"),
        nested
    )]
    pub questions: Vec<Question>,
    pub category: Option<QuizCategory>,
    pub difficulty: Option<Difficulty>,
    #[serde(alias = "timeLimit")]
    #[validate(range(min = 1, max = 300))]
    pub time_limit_minutes: Option<i64>,
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score_percent: Option<i64>,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    #[validate(
        length(min = 1, message = "At least one question is required"),
        nested
    )]
    pub questions: Option<Vec<Question>>,
    pub category: Option<QuizCategory>,
    pub difficulty: Option<Difficulty>,
    #[serde(alias = "timeLimit")]
    #[validate(range(min = 1, max = 300))]
    pub time_limit_minutes: Option<i64>,
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score_percent: Option<i64>,
    pub is_active: Option<bool>,
}

impl UpdateQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.questions.is_none()
            && self.category.is_none()
            && self.difficulty.is_none()
            && self.time_limit_minutes.is_none()
            && self.passing_score_percent.is_none()
            && self.is_active.is_none()
    }
}

/// Query parameters for listing quizzes.
#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    /// Category name, or "all".
    pub category: Option<String>,
    /// Difficulty name, or "all".
    pub difficulty: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// One entry per question, in order. `null` means "not answered".
    pub answers: Vec<Option<i64>>,
}

/// Parses a category filter. `None` means no filtering.
pub fn parse_category_filter(raw: Option<&str>) -> Option<Result<QuizCategory, String>> {
    parse_enum_filter(raw)
}

/// Parses a difficulty filter. `None` means no filtering.
pub fn parse_difficulty_filter(raw: Option<&str>) -> Option<Result<Difficulty, String>> {
    parse_enum_filter(raw)
}

/// Shared by list endpoints: empty or "all" disables the filter, anything else
/// must name an enum variant by its wire name.
pub(crate) fn parse_enum_filter<T: serde::de::DeserializeOwned>(
    raw: Option<&str>,
) -> Option<Result<T, String>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "all")?;
    Some(
        serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .map_err(|_| format!("Unknown filter value '{}'", raw)),
    )
}
