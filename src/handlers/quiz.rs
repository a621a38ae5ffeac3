// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        answer::SubmitAnswersRequest,
        question::CreateQuestionRequest,
        quiz::{CreateQuizRequest, UpdateQuizRequest},
    },
    quiz::{aggregate, ledger, lifecycle, window},
    utils::{
        access::{is_faculty_authorised, is_student_authorised},
        jwt::{FacultyPrincipal, StudentPrincipal},
    },
};

// ---------------------------------------------------------------------------
// Faculty
// ---------------------------------------------------------------------------

/// Lists every quiz of a course with question totals and attempt counts.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path(code): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;

    let quizzes = lifecycle::list_course_quizzes(&pool, code, Utc::now()).await?;
    Ok(Json(quizzes))
}

/// Creates a quiz. Returns 201 Created and the stored quiz.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path(code): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;

    let quiz = lifecycle::create_quiz(&pool, code, &payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;
    lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let quiz = lifecycle::update_quiz(&pool, quiz_id, &payload, Utc::now()).await?;
    Ok(Json(quiz))
}

/// Adds a question. Returns 201 Created and the stored question.
pub async fn add_question(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;
    lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let question = lifecycle::add_question(&pool, quiz_id, &payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Reveals results to students. Calling it again is a no-op.
pub async fn publish_quiz(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;
    lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let quiz = lifecycle::publish(&pool, quiz_id, Utc::now()).await?;
    Ok(Json(quiz))
}

pub async fn quiz_summary(
    State(pool): State<SqlitePool>,
    FacultyPrincipal(faculty_id): FacultyPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    is_faculty_authorised(&pool, faculty_id, code).await?;
    let quiz = lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let summary = aggregate::quiz_summary(&pool, &quiz, Utc::now()).await?;
    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// The student's quizzes for a course, split into active and previous.
pub async fn my_quizzes(
    State(pool): State<SqlitePool>,
    StudentPrincipal(student_id): StudentPrincipal,
    Path(code): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    is_student_authorised(&pool, student_id, code).await?;

    let listing = aggregate::student_quizzes(&pool, student_id, code, Utc::now()).await?;
    Ok(Json(listing))
}

/// Whether the attempt UI should be offered.
pub async fn attempt_status(
    State(pool): State<SqlitePool>,
    StudentPrincipal(student_id): StudentPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    is_student_authorised(&pool, student_id, code).await?;
    let quiz = lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let status = window::attempt_status(&pool, &quiz, student_id, Utc::now()).await?;
    Ok(Json(status))
}

/// Questions for an attempt, without answers.
pub async fn quiz_paper(
    State(pool): State<SqlitePool>,
    StudentPrincipal(student_id): StudentPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    is_student_authorised(&pool, student_id, code).await?;
    let quiz = lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let paper = lifecycle::quiz_paper(&pool, quiz, student_id, Utc::now()).await?;
    Ok(Json(paper))
}

/// Submits the student's single attempt.
///
/// * 403 `quiz_closed` outside the window.
/// * 409 `already_attempted` on any resubmission; nothing is written.
pub async fn submit_answers(
    State(pool): State<SqlitePool>,
    StudentPrincipal(student_id): StudentPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    is_student_authorised(&pool, student_id, code).await?;
    lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let result = ledger::submit(&pool, student_id, quiz_id, &req.answers, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn quiz_result(
    State(pool): State<SqlitePool>,
    StudentPrincipal(student_id): StudentPrincipal,
    Path((code, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    is_student_authorised(&pool, student_id, code).await?;
    let quiz = lifecycle::fetch_quiz_in_course(&pool, code, quiz_id).await?;

    let result = aggregate::student_result(&pool, student_id, &quiz).await?;
    Ok(Json(result))
}
