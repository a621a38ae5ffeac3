// tests/common/mod.rs
#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use elms_quiz::models::{
    question::{CreateQuestionRequest, OptionTag},
    quiz::CreateQuizRequest,
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub const FACULTY_ID: i64 = 1;
pub const OTHER_FACULTY_ID: i64 = 2;
pub const COURSE_CODE: i64 = 101;
pub const ENROLLED: [i64; 3] = [1001, 1002, 1003];
pub const NOT_ENROLLED: i64 = 2001;

/// In-memory database with migrations applied.
/// One connection, never recycled, so every query sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    elms_quiz::db::migrate(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// Seeds one course owned by `FACULTY_ID`, three enrolled students and one outsider.
pub async fn seed(pool: &SqlitePool) {
    for (id, name) in [(FACULTY_ID, "Dr. Tran"), (OTHER_FACULTY_ID, "Dr. Le")] {
        sqlx::query("INSERT INTO faculty (faculty_id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO courses (code, name, faculty_id) VALUES (?, ?, ?)")
        .bind(COURSE_CODE)
        .bind("Computer Networks")
        .bind(FACULTY_ID)
        .execute(pool)
        .await
        .unwrap();

    for id in ENROLLED.iter().copied().chain([NOT_ENROLLED]) {
        sqlx::query("INSERT INTO students (student_id, name) VALUES (?, ?)")
            .bind(id)
            .bind(format!("Student {}", id))
            .execute(pool)
            .await
            .unwrap();
    }

    for id in ENROLLED {
        sqlx::query("INSERT INTO enrollments (student_id, course_code) VALUES (?, ?)")
            .bind(id)
            .bind(COURSE_CODE)
            .execute(pool)
            .await
            .unwrap();
    }
}

pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

pub fn quiz_request(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateQuizRequest {
    CreateQuizRequest {
        title: "Weekly quiz".to_string(),
        description: Some("Chapter 3".to_string()),
        start,
        end,
        publish_status: false,
    }
}

pub fn question_request(answer: OptionTag, marks: i64) -> CreateQuestionRequest {
    CreateQuestionRequest {
        question: "Which layer routes packets?".to_string(),
        options: vec![
            "Physical".to_string(),
            "Network".to_string(),
            "Session".to_string(),
            "Application".to_string(),
        ],
        answer,
        marks,
        explanation: Some("Routing is a network layer job.".to_string()),
    }
}

pub async fn answer_rows(pool: &SqlitePool, quiz_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM student_answers WHERE quiz_id = ?")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
