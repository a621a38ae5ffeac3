// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'courses' table. Owned by the course CRUD layer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub code: i64,
    pub name: String,
    /// Faculty member in charge, if any.
    pub faculty_id: Option<i64>,
}

/// Represents the 'students' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub name: String,
    pub email: Option<String>,
}
