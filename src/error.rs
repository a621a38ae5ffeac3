// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes the quiz engine's error taxonomy and its mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    /// Quiz window is empty or inverted (`end <= start`).
    InvalidSchedule(String),

    /// Question authoring failed validation (negative marks, wrong option count...).
    InvalidQuestion(String),

    // 401 Unauthorized
    AuthError(String),

    /// Principal lacks access to the course, or has the wrong role.
    NotAuthorized(String),

    /// Attempt made outside the quiz window.
    QuizClosed(i64),

    /// At least one (student, quiz, question) row already exists.
    /// Carries the ids of the questions that collided.
    AlreadyAttempted { quiz_id: i64, question_ids: Vec<i64> },

    // 404 Not Found
    NotFound(String),
    UnknownQuiz(i64),
    UnknownStudent(i64),
    UnknownQuestion(Vec<i64>),
}

impl AppError {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal",
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidSchedule(_) => "invalid_schedule",
            AppError::InvalidQuestion(_) => "invalid_question",
            AppError::AuthError(_) => "unauthorized",
            AppError::NotAuthorized(_) => "not_authorized",
            AppError::QuizClosed(_) => "quiz_closed",
            AppError::AlreadyAttempted { .. } => "already_attempted",
            AppError::NotFound(_) => "not_found",
            AppError::UnknownQuiz(_) => "unknown_quiz",
            AppError::UnknownStudent(_) => "unknown_student",
            AppError::UnknownQuestion(_) => "unknown_question",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_)
            | AppError::InvalidSchedule(_)
            | AppError::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized(_) | AppError::QuizClosed(_) => StatusCode::FORBIDDEN,
            AppError::AlreadyAttempted { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_)
            | AppError::UnknownQuiz(_)
            | AppError::UnknownStudent(_)
            | AppError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg)
            | AppError::BadRequest(msg)
            | AppError::InvalidSchedule(msg)
            | AppError::InvalidQuestion(msg)
            | AppError::AuthError(msg)
            | AppError::NotAuthorized(msg)
            | AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::QuizClosed(id) => write!(f, "Quiz {} is not open", id),
            AppError::AlreadyAttempted { quiz_id, .. } => {
                write!(f, "Quiz {} has already been submitted", quiz_id)
            }
            AppError::UnknownQuiz(id) => write!(f, "Quiz {} not found", id),
            AppError::UnknownStudent(id) => write!(f, "Student {} not found", id),
            AppError::UnknownQuestion(ids) => {
                write!(f, "Questions {:?} do not belong to this quiz", ids)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({ "error": "Internal Server Error", "code": code })
            }
            AppError::AlreadyAttempted { question_ids, .. }
            | AppError::UnknownQuestion(question_ids) => json!({
                "error": self.to_string(),
                "code": code,
                "question_ids": question_ids,
            }),
            _ => json!({ "error": self.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// True when the error is a violated UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_student_errors_map_to_distinct_statuses() {
        let closed = AppError::QuizClosed(7);
        let dup = AppError::AlreadyAttempted {
            quiz_id: 7,
            question_ids: vec![1, 2],
        };

        assert_eq!(closed.status(), StatusCode::FORBIDDEN);
        assert_eq!(closed.code(), "quiz_closed");
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert_eq!(dup.code(), "already_attempted");
    }

    #[test]
    fn test_authoring_errors_are_bad_requests() {
        assert_eq!(
            AppError::InvalidSchedule("end before start".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidQuestion("negative marks".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_lookup_failures_are_not_found() {
        for err in [
            AppError::UnknownQuiz(1),
            AppError::UnknownStudent(2),
            AppError::UnknownQuestion(vec![3]),
        ] {
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_internal_error_hides_message() {
        let response = AppError::InternalServerError("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
