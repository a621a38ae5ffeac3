// src/quiz/ledger.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        answer::SubmissionResult,
        question::{OptionTag, Question},
    },
    quiz::{lifecycle, percentage, window},
    utils::access,
};

/// One ledger row, graded but not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected: Option<OptionTag>,
    pub awarded: i64,
}

/// Grades every question of the quiz. Questions missing from `answers` are recorded blank.
pub fn grade(questions: &[Question], answers: &HashMap<i64, OptionTag>) -> Vec<GradedAnswer> {
    questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id).copied();
            GradedAnswer {
                question_id: q.id,
                selected,
                awarded: q.award(selected),
            }
        })
        .collect()
}

/// Submitted ids that are not questions of this quiz, sorted.
pub fn foreign_question_ids(questions: &[Question], answers: &HashMap<i64, OptionTag>) -> Vec<i64> {
    let known: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    let mut unknown: Vec<i64> = answers
        .keys()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();
    unknown.sort_unstable();
    unknown
}

/// Question ids already recorded for (student, quiz).
pub async fn recorded_question_ids(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT question_id FROM student_answers WHERE student_id = ? AND quiz_id = ? ORDER BY question_id",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Timestamp of the earliest recorded answer for the quiz, if anyone has attempted it.
pub async fn first_recorded_at(
    pool: &SqlitePool,
    quiz_id: i64,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let first = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM student_answers WHERE quiz_id = ? ORDER BY created_at LIMIT 1",
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?;

    Ok(first)
}

/// Records a student's single attempt at a quiz.
///
/// * Fails with `QuizClosed` outside `[start, end)`.
/// * Fails with `UnknownQuestion` if an answer targets a question of another quiz.
/// * Writes one row per question of the quiz inside a single transaction,
///   all stamped with `now`. A UNIQUE violation on any row rolls the whole
///   attempt back and yields `AlreadyAttempted`.
pub async fn submit(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
    answers: &HashMap<i64, OptionTag>,
    now: DateTime<Utc>,
) -> Result<SubmissionResult, AppError> {
    let quiz = lifecycle::fetch_quiz(pool, quiz_id).await?;
    access::fetch_student(pool, student_id).await?;

    if !window::is_open(&quiz, now) {
        tracing::warn!(student_id, quiz_id, "Submission outside the quiz window");
        return Err(AppError::QuizClosed(quiz_id));
    }

    let questions = lifecycle::fetch_questions(pool, quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest("Quiz has no questions".to_string()));
    }

    let unknown = foreign_question_ids(&questions, answers);
    if !unknown.is_empty() {
        return Err(AppError::UnknownQuestion(unknown));
    }

    let graded = grade(&questions, answers);

    // Only writes happen inside the transaction; the UNIQUE constraint is the guard.
    let mut tx = pool.begin().await?;

    for row in &graded {
        let inserted = sqlx::query(
            r#"
            INSERT INTO student_answers (student_id, quiz_id, question_id, answer, marks, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(quiz_id)
        .bind(row.question_id)
        .bind(row.selected)
        .bind(row.awarded)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            tx.rollback().await?;

            if is_unique_violation(&e) {
                let question_ids = recorded_question_ids(pool, student_id, quiz_id).await?;
                tracing::warn!(student_id, quiz_id, "Duplicate attempt rejected");
                return Err(AppError::AlreadyAttempted {
                    quiz_id,
                    question_ids,
                });
            }

            tracing::error!("Failed to record answer: {:?}", e);
            return Err(AppError::from(e));
        }
    }

    tx.commit().await?;

    let marks_obtained: i64 = graded.iter().map(|g| g.awarded).sum();
    let total_marks = lifecycle::total_marks(&questions);

    tracing::info!(
        student_id,
        quiz_id,
        marks_obtained,
        total_marks,
        "Attempt recorded"
    );

    Ok(SubmissionResult {
        quiz_id,
        student_id,
        answered: graded.iter().filter(|g| g.selected.is_some()).count(),
        marks_obtained,
        total_marks,
        percentage: percentage(marks_obtained, total_marks),
        submitted_at: now,
    })
}
