// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    pub description: Option<String>,

    /// Code of the owning course.
    pub course_code: i64,

    /// Opening instant of the quiz window (inclusive).
    #[sqlx(rename = "start_at")]
    pub start: DateTime<Utc>,

    /// Closing instant of the quiz window (exclusive). Always after `start`.
    #[sqlx(rename = "end_at")]
    pub end: DateTime<Utc>,

    /// Set once the instructor reveals results. Never reverts.
    pub publish_status: bool,

    /// Set once the window start has been observed to pass.
    pub started: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn duration_in_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Lifecycle state, derived from the stored window and publish flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizState {
    Scheduled,
    Open,
    Closed,
    Published,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub publish_status: bool,
}

/// DTO for an instructor edit. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    /// An empty string clears the stored description.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Instructor-facing listing entry for a course's quizzes.
#[derive(Debug, Serialize)]
pub struct QuizOverview {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub state: QuizState,
    pub duration_seconds: i64,
    pub total_questions: i64,
    pub total_marks: i64,
    pub attempted_students: i64,
}

/// The attempt view handed to a student: questions without answers.
#[derive(Debug, Serialize)]
pub struct QuizPaper {
    pub quiz_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_questions: usize,
    pub total_marks: i64,
    pub questions: Vec<crate::models::question::PublicQuestion>,
}
