// src/models/result.rs
//
// Read-only views built by the aggregator. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{question::OptionTag, quiz::QuizState};

/// One question of a student's result sheet.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    pub question_id: i64,
    pub question: String,
    pub selected: Option<OptionTag>,
    pub awarded_marks: i64,
    pub marks: i64,
    /// Revealed only after the quiz is published.
    pub correct_option: Option<OptionTag>,
    pub correct_text: Option<String>,
    pub explanation: Option<String>,
}

/// A student's view of their own attempt.
#[derive(Debug, Clone, Serialize)]
pub struct StudentResult {
    pub quiz_id: i64,
    pub student_id: i64,
    pub marks_obtained: i64,
    pub total_marks: i64,
    pub percentage: f64,
    pub time_taken_seconds: f64,
    pub submitted_at: DateTime<Utc>,
    pub published: bool,
    pub answers: Vec<AnswerReview>,
}

/// How many rows picked each option letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptionDistribution {
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B")]
    pub b: i64,
    #[serde(rename = "C")]
    pub c: i64,
    #[serde(rename = "D")]
    pub d: i64,
}

impl OptionDistribution {
    pub fn record(&mut self, tag: OptionTag) {
        match tag {
            OptionTag::A => self.a += 1,
            OptionTag::B => self.b += 1,
            OptionTag::C => self.c += 1,
            OptionTag::D => self.d += 1,
        }
    }

    pub fn get(&self, tag: OptionTag) -> i64 {
        match tag {
            OptionTag::A => self.a,
            OptionTag::B => self.b,
            OptionTag::C => self.c,
            OptionTag::D => self.d,
        }
    }
}

/// Per-question statistics for the instructor summary.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionStats {
    pub question_id: i64,
    pub question: String,
    pub correct_option: OptionTag,
    pub marks: i64,
    pub distribution: OptionDistribution,
    pub unanswered: i64,
    pub correct_count: i64,
    /// Wrong picks plus blanks.
    pub incorrect_count: i64,
}

/// One enrolled student in the instructor summary.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub student_id: i64,
    pub name: String,
    pub attempted: bool,
    pub marks_obtained: i64,
    pub percentage: f64,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Class-wide summary of one quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub quiz_id: i64,
    pub title: String,
    pub state: QuizState,
    pub total_marks: i64,
    pub total_students: i64,
    pub attempted_count: i64,
    pub completion_rate: f64,
    pub questions: Vec<QuestionStats>,
    pub students: Vec<StudentRow>,
}

/// A quiz in a student's course listing.
#[derive(Debug, Clone, Serialize)]
pub struct StudentQuizEntry {
    pub quiz_id: i64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub state: QuizState,
    pub attempted: bool,
    pub total_questions: i64,
    pub total_marks: i64,
    pub marks_obtained: Option<i64>,
    pub percentage: Option<f64>,
}

/// A student's quizzes for one course, split the way the course page shows them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentQuizzes {
    /// Not yet ended and not yet attempted.
    pub active: Vec<StudentQuizEntry>,
    /// Ended, or already attempted.
    pub previous: Vec<StudentQuizEntry>,
}

/// Gate read by the caller before presenting the attempt UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AttemptStatus {
    pub quiz_id: i64,
    pub state: QuizState,
    pub is_open: bool,
    pub has_attempted: bool,
    pub can_attempt: bool,
}
