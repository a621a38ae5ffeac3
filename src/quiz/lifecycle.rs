// src/quiz/lifecycle.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, PublicQuestion, Question},
        quiz::{CreateQuizRequest, Quiz, QuizOverview, QuizPaper, UpdateQuizRequest},
    },
    quiz::{ledger, window},
    utils::{access, html::clean_html},
};

/// Helper struct for per-quiz question totals.
#[derive(sqlx::FromRow)]
struct QuestionTotals {
    quiz_id: i64,
    total_questions: i64,
    total_marks: i64,
}

/// Helper struct for per-quiz attempt counts.
#[derive(sqlx::FromRow)]
struct AttemptCount {
    quiz_id: i64,
    attempted: i64,
}

const TITLE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Sanitized title. The length bound applies to what is stored, not to the raw input.
fn clean_title(raw: &str) -> Result<String, AppError> {
    let title = clean_html(raw).trim().to_string();
    let len = title.chars().count();
    if len == 0 || len > TITLE_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "Title must be 1 to {} characters after sanitizing",
            TITLE_MAX_CHARS
        )));
    }
    Ok(title)
}

/// Sanitized description. Blank text maps to `None`.
fn clean_description(raw: &str) -> Result<Option<String>, AppError> {
    let description = clean_html(raw).trim().to_string();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "Description must be at most {} characters after sanitizing",
            DESCRIPTION_MAX_CHARS
        )));
    }
    Ok((!description.is_empty()).then_some(description))
}

/// Rejects an empty or inverted window.
pub fn validate_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::InvalidSchedule(format!(
            "Quiz must end after it starts (start {}, end {})",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok(())
}

pub async fn fetch_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UnknownQuiz(quiz_id))
}

/// Like `fetch_quiz`, but a quiz from another course counts as unknown.
pub async fn fetch_quiz_in_course(
    pool: &SqlitePool,
    course_code: i64,
    quiz_id: i64,
) -> Result<Quiz, AppError> {
    let quiz = fetch_quiz(pool, quiz_id).await?;
    if quiz.course_code != course_code {
        return Err(AppError::UnknownQuiz(quiz_id));
    }
    Ok(quiz)
}

/// Questions of a quiz in authoring order.
pub async fn fetch_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE quiz_id = ? ORDER BY id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// Sum of question marks. Computed fresh on every read.
pub fn total_marks(questions: &[Question]) -> i64 {
    questions.iter().map(|q| q.marks).sum()
}

/// Creates a quiz for `course_code`.
///
/// * Validates the title/description lengths.
/// * Rejects `end <= start` with `InvalidSchedule`.
/// * Sanitizes free text before storing it.
pub async fn create_quiz(
    pool: &SqlitePool,
    course_code: i64,
    req: &CreateQuizRequest,
    now: DateTime<Utc>,
) -> Result<Quiz, AppError> {
    req.validate()?;
    validate_schedule(req.start, req.end)?;
    let title = clean_title(&req.title)?;
    let description = req.description.as_deref().map(clean_description).transpose()?.flatten();
    access::fetch_course(pool, course_code).await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes
        (title, description, course_code, start_at, end_at, publish_status, started, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(course_code)
    .bind(req.start)
    .bind(req.end)
    .bind(req.publish_status)
    .bind(req.start <= now)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        quiz_id = quiz.id,
        course_code,
        "Quiz '{}' created",
        quiz.title
    );

    Ok(quiz)
}

/// Explicit instructor edit. Absent fields keep their value; the merged window is re-validated.
///
/// * An empty `description` clears the stored one.
/// * Once attempts exist, `start` cannot move past the first recorded submission.
pub async fn update_quiz(
    pool: &SqlitePool,
    quiz_id: i64,
    req: &UpdateQuizRequest,
    now: DateTime<Utc>,
) -> Result<Quiz, AppError> {
    req.validate()?;
    let current = fetch_quiz(pool, quiz_id).await?;

    let title = match req.title.as_deref() {
        Some(t) => clean_title(t)?,
        None => current.title,
    };
    let description = match req.description.as_deref() {
        Some(d) => clean_description(d)?,
        None => current.description,
    };
    let start = req.start.unwrap_or(current.start);
    let end = req.end.unwrap_or(current.end);
    validate_schedule(start, end)?;

    if start != current.start {
        if let Some(first) = ledger::first_recorded_at(pool, quiz_id).await? {
            if start > first {
                return Err(AppError::InvalidSchedule(format!(
                    "Quiz already has attempts from {}; start cannot move past it",
                    first.to_rfc3339()
                )));
            }
        }
    }

    // `started` never goes back to false.
    let started = current.started || start <= now;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        UPDATE quizzes
        SET title = ?, description = ?, start_at = ?, end_at = ?, started = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(start)
    .bind(end)
    .bind(started)
    .bind(now)
    .bind(quiz_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(quiz_id, "Quiz updated");

    Ok(quiz)
}

/// Adds a question to a quiz. Allowed at any time, including while the quiz is open.
pub async fn add_question(
    pool: &SqlitePool,
    quiz_id: i64,
    req: &CreateQuestionRequest,
    now: DateTime<Utc>,
) -> Result<Question, AppError> {
    req.validate()
        .map_err(|e| AppError::InvalidQuestion(e.to_string()))?;

    fetch_quiz(pool, quiz_id).await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions
        (quiz_id, question, option1, option2, option3, option4, answer, marks, explanation, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(quiz_id)
    .bind(clean_html(&req.question))
    .bind(clean_html(&req.options[0]))
    .bind(clean_html(&req.options[1]))
    .bind(clean_html(&req.options[2]))
    .bind(clean_html(&req.options[3]))
    .bind(req.answer)
    .bind(req.marks)
    .bind(req.explanation.as_deref().map(clean_html))
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to add question: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(quiz_id, question_id = question.id, "Question added");

    Ok(question)
}

/// Reveals results. Idempotent; the flag is never cleared.
pub async fn publish(pool: &SqlitePool, quiz_id: i64, now: DateTime<Utc>) -> Result<Quiz, AppError> {
    let quiz = fetch_quiz(pool, quiz_id).await?;
    if quiz.publish_status {
        return Ok(quiz);
    }

    let quiz = sqlx::query_as::<_, Quiz>(
        "UPDATE quizzes SET publish_status = 1, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(now)
    .bind(quiz_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(quiz_id, "Quiz results published");

    Ok(quiz)
}

/// Persists `started = true` for quizzes whose window start has passed.
async fn mark_started(pool: &SqlitePool, quizzes: &mut [Quiz], now: DateTime<Utc>) -> Result<(), AppError> {
    let due: Vec<i64> = quizzes
        .iter()
        .filter(|q| !q.started && q.start <= now)
        .map(|q| q.id)
        .collect();

    if due.is_empty() {
        return Ok(());
    }

    let mut query_builder =
        QueryBuilder::<Sqlite>::new("UPDATE quizzes SET started = 1 WHERE id IN (");
    let mut separated = query_builder.separated(",");
    for id in &due {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    query_builder.build().execute(pool).await?;

    for quiz in quizzes.iter_mut().filter(|q| due.contains(&q.id)) {
        quiz.started = true;
    }
    Ok(())
}

/// Instructor listing of a course's quizzes, newest first.
pub async fn list_course_quizzes(
    pool: &SqlitePool,
    course_code: i64,
    now: DateTime<Utc>,
) -> Result<Vec<QuizOverview>, AppError> {
    let mut quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE course_code = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?;

    mark_started(pool, &mut quizzes, now).await?;

    let totals: HashMap<i64, QuestionTotals> = sqlx::query_as::<_, QuestionTotals>(
        r#"
        SELECT q.quiz_id, COUNT(*) AS total_questions, COALESCE(SUM(q.marks), 0) AS total_marks
        FROM questions q
        JOIN quizzes z ON z.id = q.quiz_id
        WHERE z.course_code = ?
        GROUP BY q.quiz_id
        "#,
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|t| (t.quiz_id, t))
    .collect();

    let attempts: HashMap<i64, i64> = sqlx::query_as::<_, AttemptCount>(
        r#"
        SELECT a.quiz_id, COUNT(DISTINCT a.student_id) AS attempted
        FROM student_answers a
        JOIN quizzes z ON z.id = a.quiz_id
        WHERE z.course_code = ?
        GROUP BY a.quiz_id
        "#,
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|c| (c.quiz_id, c.attempted))
    .collect();

    let overviews = quizzes
        .into_iter()
        .map(|quiz| {
            let (total_questions, total_marks) = totals
                .get(&quiz.id)
                .map(|t| (t.total_questions, t.total_marks))
                .unwrap_or((0, 0));
            QuizOverview {
                state: window::state(&quiz, now),
                duration_seconds: quiz.duration_in_seconds(),
                total_questions,
                total_marks,
                attempted_students: attempts.get(&quiz.id).copied().unwrap_or(0),
                quiz,
            }
        })
        .collect();

    Ok(overviews)
}

/// The attempt view. Only served while the quiz is open and unattempted.
pub async fn quiz_paper(
    pool: &SqlitePool,
    quiz: Quiz,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<QuizPaper, AppError> {
    if !window::is_open(&quiz, now) {
        return Err(AppError::QuizClosed(quiz.id));
    }

    let recorded = ledger::recorded_question_ids(pool, student_id, quiz.id).await?;
    if !recorded.is_empty() {
        return Err(AppError::AlreadyAttempted {
            quiz_id: quiz.id,
            question_ids: recorded,
        });
    }

    let questions = fetch_questions(pool, quiz.id).await?;
    let total_marks = total_marks(&questions);

    Ok(QuizPaper {
        quiz_id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        start: quiz.start,
        end: quiz.end,
        total_questions: questions.len(),
        total_marks,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    })
}
