// src/quiz/window.rs

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        quiz::{Quiz, QuizState},
        result::AttemptStatus,
    },
};

/// True iff `now` lies in the half-open window `[start, end)`.
pub fn is_open(quiz: &Quiz, now: DateTime<Utc>) -> bool {
    quiz.start <= now && now < quiz.end
}

/// Derives the lifecycle state. `Published` only shows once the window has closed.
pub fn state(quiz: &Quiz, now: DateTime<Utc>) -> QuizState {
    if now < quiz.start {
        QuizState::Scheduled
    } else if is_open(quiz, now) {
        QuizState::Open
    } else if quiz.publish_status {
        QuizState::Published
    } else {
        QuizState::Closed
    }
}

/// True iff the ledger holds any answer of `student_id` for `quiz_id`.
/// Advisory: the UNIQUE constraint in the ledger is what actually enforces one attempt.
pub async fn has_attempted(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM student_answers WHERE student_id = ? AND quiz_id = ?",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn attempt_status(
    pool: &SqlitePool,
    quiz: &Quiz,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<AttemptStatus, AppError> {
    let open = is_open(quiz, now);
    let attempted = has_attempted(pool, student_id, quiz.id).await?;

    Ok(AttemptStatus {
        quiz_id: quiz.id,
        state: state(quiz, now),
        is_open: open,
        has_attempted: attempted,
        can_attempt: open && !attempted,
    })
}
