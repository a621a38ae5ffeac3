// src/models/answer.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::OptionTag;

/// Represents the 'student_answers' table: the append-only answer ledger.
/// At most one row exists per (student, quiz, question).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    pub question_id: i64,

    /// Selected option, `None` when the question was left blank.
    pub answer: Option<OptionTag>,

    /// Marks awarded at write time: the question's marks or 0.
    pub marks: i64,

    /// Submission instant, shared by every row of one attempt.
    pub created_at: DateTime<Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    /// User's answers map.
    /// Key: Question ID
    /// Value: Selected option letter
    pub answers: HashMap<i64, OptionTag>,
}

/// Outcome of an accepted attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub quiz_id: i64,
    pub student_id: i64,
    /// Number of questions the student picked an option for.
    pub answered: usize,
    pub marks_obtained: i64,
    pub total_marks: i64,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}
