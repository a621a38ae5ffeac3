// src/utils/access.rs

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::course::{Course, Student},
};

pub async fn fetch_course(pool: &SqlitePool, course_code: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>("SELECT code, name, faculty_id FROM courses WHERE code = ?")
        .bind(course_code)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_code)))
}

pub async fn fetch_student(pool: &SqlitePool, student_id: i64) -> Result<Student, AppError> {
    sqlx::query_as::<_, Student>("SELECT student_id, name, email FROM students WHERE student_id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UnknownStudent(student_id))
}

/// Students enrolled in a course, by id.
pub async fn enrolled_students(pool: &SqlitePool, course_code: i64) -> Result<Vec<Student>, AppError> {
    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT s.student_id, s.name, s.email
        FROM students s
        JOIN enrollments e ON e.student_id = s.student_id
        WHERE e.course_code = ?
        ORDER BY s.student_id
        "#,
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

/// The faculty member must be the one in charge of the course.
pub async fn is_faculty_authorised(
    pool: &SqlitePool,
    faculty_id: i64,
    course_code: i64,
) -> Result<Course, AppError> {
    let course = fetch_course(pool, course_code).await?;
    if course.faculty_id != Some(faculty_id) {
        tracing::warn!(faculty_id, course_code, "Faculty not in charge of course");
        return Err(AppError::NotAuthorized(format!(
            "Not in charge of course {}",
            course_code
        )));
    }
    Ok(course)
}

/// The student must exist and be enrolled in the course.
pub async fn is_student_authorised(
    pool: &SqlitePool,
    student_id: i64,
    course_code: i64,
) -> Result<Course, AppError> {
    let course = fetch_course(pool, course_code).await?;
    fetch_student(pool, student_id).await?;

    let enrolled: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = ? AND course_code = ?",
    )
    .bind(student_id)
    .bind(course_code)
    .fetch_one(pool)
    .await?;

    if enrolled == 0 {
        tracing::warn!(student_id, course_code, "Student not enrolled in course");
        return Err(AppError::NotAuthorized(format!(
            "Not enrolled in course {}",
            course_code
        )));
    }
    Ok(course)
}
