// src/quiz/aggregate.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        answer::StudentAnswer,
        course::Student,
        question::Question,
        quiz::Quiz,
        result::{
            AnswerReview, OptionDistribution, QuestionStats, QuizSummary, StudentQuizEntry,
            StudentQuizzes, StudentResult, StudentRow,
        },
    },
    quiz::{lifecycle, percentage, round2, window},
    utils::access,
};

/// The attempt's submission instant: the latest row timestamp.
/// Rows of one attempt share a single timestamp, so this is also the earliest.
fn submitted_at(rows: &[&StudentAnswer]) -> Option<DateTime<Utc>> {
    rows.iter().map(|r| r.created_at).max()
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    round2((to - from).num_milliseconds() as f64 / 1000.0)
}

/// Builds a student's result sheet from their ledger rows. `None` when there are no rows.
pub fn build_student_result(
    quiz: &Quiz,
    student_id: i64,
    questions: &[Question],
    rows: &[StudentAnswer],
) -> Option<StudentResult> {
    let own: Vec<&StudentAnswer> = rows
        .iter()
        .filter(|r| r.student_id == student_id && r.quiz_id == quiz.id)
        .collect();
    let submitted_at = submitted_at(&own)?;

    let by_question: HashMap<i64, &StudentAnswer> =
        own.iter().map(|r| (r.question_id, *r)).collect();

    let published = quiz.publish_status;
    let answers = questions
        .iter()
        .map(|q| {
            let row = by_question.get(&q.id);
            AnswerReview {
                question_id: q.id,
                question: q.question.clone(),
                selected: row.and_then(|r| r.answer),
                awarded_marks: row.map(|r| r.marks).unwrap_or(0),
                marks: q.marks,
                correct_option: published.then_some(q.answer),
                correct_text: published.then(|| q.correct_text().to_string()),
                explanation: if published { q.explanation.clone() } else { None },
            }
        })
        .collect();

    let marks_obtained: i64 = own.iter().map(|r| r.marks).sum();
    let total_marks = lifecycle::total_marks(questions);

    Some(StudentResult {
        quiz_id: quiz.id,
        student_id,
        marks_obtained,
        total_marks,
        percentage: percentage(marks_obtained, total_marks),
        time_taken_seconds: seconds_between(quiz.start, submitted_at),
        submitted_at,
        published,
        answers,
    })
}

/// Builds the instructor summary: per-question statistics plus one row per enrolled student.
pub fn build_quiz_summary(
    quiz: &Quiz,
    questions: &[Question],
    students: &[Student],
    rows: &[StudentAnswer],
    now: DateTime<Utc>,
) -> QuizSummary {
    let total_marks = lifecycle::total_marks(questions);

    let question_stats = questions
        .iter()
        .map(|q| {
            let mut distribution = OptionDistribution::default();
            let mut unanswered = 0;
            for row in rows.iter().filter(|r| r.question_id == q.id) {
                match row.answer {
                    Some(tag) => distribution.record(tag),
                    None => unanswered += 1,
                }
            }
            let correct_count = distribution.get(q.answer);
            let answered = distribution.a + distribution.b + distribution.c + distribution.d;

            QuestionStats {
                question_id: q.id,
                question: q.question.clone(),
                correct_option: q.answer,
                marks: q.marks,
                distribution,
                unanswered,
                correct_count,
                incorrect_count: answered + unanswered - correct_count,
            }
        })
        .collect();

    let mut by_student: HashMap<i64, Vec<&StudentAnswer>> = HashMap::new();
    for row in rows {
        by_student.entry(row.student_id).or_default().push(row);
    }

    let student_rows: Vec<StudentRow> = students
        .iter()
        .map(|s| {
            let own = by_student.get(&s.student_id).map(Vec::as_slice).unwrap_or(&[]);
            let marks_obtained: i64 = own.iter().map(|r| r.marks).sum();
            StudentRow {
                student_id: s.student_id,
                name: s.name.clone(),
                attempted: !own.is_empty(),
                marks_obtained,
                percentage: percentage(marks_obtained, total_marks),
                submitted_at: submitted_at(own),
            }
        })
        .collect();

    let total_students = student_rows.len() as i64;
    let attempted_count = student_rows.iter().filter(|r| r.attempted).count() as i64;

    QuizSummary {
        quiz_id: quiz.id,
        title: quiz.title.clone(),
        state: window::state(quiz, now),
        total_marks,
        total_students,
        attempted_count,
        completion_rate: percentage(attempted_count, total_students),
        questions: question_stats,
        students: student_rows,
    }
}

async fn fetch_rows(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<StudentAnswer>, AppError> {
    let rows = sqlx::query_as::<_, StudentAnswer>(
        "SELECT * FROM student_answers WHERE quiz_id = ? ORDER BY student_id, question_id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A student's result for one quiz. `NotFound` if they never attempted it.
pub async fn student_result(
    pool: &SqlitePool,
    student_id: i64,
    quiz: &Quiz,
) -> Result<StudentResult, AppError> {
    let rows = sqlx::query_as::<_, StudentAnswer>(
        "SELECT * FROM student_answers WHERE quiz_id = ? AND student_id = ? ORDER BY question_id",
    )
    .bind(quiz.id)
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let questions = lifecycle::fetch_questions(pool, quiz.id).await?;

    build_student_result(quiz, student_id, &questions, &rows).ok_or_else(|| {
        AppError::NotFound(format!(
            "Student {} has not attempted quiz {}",
            student_id, quiz.id
        ))
    })
}

/// Class-wide statistics for the instructor.
pub async fn quiz_summary(
    pool: &SqlitePool,
    quiz: &Quiz,
    now: DateTime<Utc>,
) -> Result<QuizSummary, AppError> {
    let questions = lifecycle::fetch_questions(pool, quiz.id).await?;
    let students = access::enrolled_students(pool, quiz.course_code).await?;
    let rows = fetch_rows(pool, quiz.id).await?;

    Ok(build_quiz_summary(quiz, &questions, &students, &rows, now))
}

/// Splits a student's course quizzes into active and previous ones.
pub fn build_student_quizzes(
    quizzes: &[Quiz],
    questions: &[Question],
    rows: &[StudentAnswer],
    now: DateTime<Utc>,
) -> StudentQuizzes {
    let mut listing = StudentQuizzes::default();

    for quiz in quizzes {
        let own_questions: Vec<Question> = questions
            .iter()
            .filter(|q| q.quiz_id == quiz.id)
            .cloned()
            .collect();
        let own_rows: Vec<&StudentAnswer> = rows.iter().filter(|r| r.quiz_id == quiz.id).collect();
        let attempted = !own_rows.is_empty();
        let total_marks = lifecycle::total_marks(&own_questions);
        let marks_obtained: i64 = own_rows.iter().map(|r| r.marks).sum();

        let entry = StudentQuizEntry {
            quiz_id: quiz.id,
            title: quiz.title.clone(),
            start: quiz.start,
            end: quiz.end,
            state: window::state(quiz, now),
            attempted,
            total_questions: own_questions.len() as i64,
            total_marks,
            marks_obtained: attempted.then_some(marks_obtained),
            percentage: attempted.then(|| percentage(marks_obtained, total_marks)),
        };

        if now >= quiz.end || attempted {
            listing.previous.push(entry);
        } else {
            listing.active.push(entry);
        }
    }

    listing
}

/// Course quiz listing for a student, newest first.
pub async fn student_quizzes(
    pool: &SqlitePool,
    student_id: i64,
    course_code: i64,
    now: DateTime<Utc>,
) -> Result<StudentQuizzes, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE course_code = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.* FROM questions q
        JOIN quizzes z ON z.id = q.quiz_id
        WHERE z.course_code = ?
        ORDER BY q.id
        "#,
    )
    .bind(course_code)
    .fetch_all(pool)
    .await?;

    let rows = sqlx::query_as::<_, StudentAnswer>(
        r#"
        SELECT a.* FROM student_answers a
        JOIN quizzes z ON z.id = a.quiz_id
        WHERE z.course_code = ? AND a.student_id = ?
        "#,
    )
    .bind(course_code)
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(build_student_quizzes(&quizzes, &questions, &rows, now))
}
