// tests/api_tests.rs

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::*;
use elms_quiz::{
    config::Config,
    routes,
    state::AppState,
    utils::jwt::{ROLE_FACULTY, ROLE_STUDENT, sign_jwt},
};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test_secret_for_integration_tests";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        log_dir: "logs".to_string(),
    }
}

/// Router over a fresh in-memory database with one seeded course.
async fn test_router() -> axum::Router {
    let pool = test_pool().await;
    seed(&pool).await;

    routes::create_router(AppState {
        pool,
        config: test_config(),
    })
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let app = test_router().await;

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn faculty_token(id: i64) -> String {
    sign_jwt(id, ROLE_FACULTY, SECRET, 600).unwrap()
}

fn student_token(id: i64) -> String {
    sign_jwt(id, ROLE_STUDENT, SECRET, 600).unwrap()
}

/// Creates a quiz open for the next hour with a single 5-mark question (answer B).
async fn open_quiz(client: &reqwest::Client, address: &str) -> (i64, i64) {
    let now = Utc::now();
    let quiz: Value = client
        .post(format!("{}/api/courses/{}/quizzes", address, COURSE_CODE))
        .bearer_auth(faculty_token(FACULTY_ID))
        .json(&json!({
            "title": "Routing basics",
            "description": "Layers and addressing",
            "start": now - Duration::hours(1),
            "end": now + Duration::hours(1)
        }))
        .send()
        .await
        .expect("Create quiz failed")
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().expect("quiz id");

    let response = client
        .post(format!("{}/api/courses/{}/quizzes/{}/questions", address, COURSE_CODE, quiz_id))
        .bearer_auth(faculty_token(FACULTY_ID))
        .json(&json!({
            "question": "Which layer routes packets?",
            "options": ["Physical", "Network", "Session", "Application"],
            "answer": "B",
            "marks": 5,
            "explanation": "Routing is a network layer job."
        }))
        .send()
        .await
        .expect("Add question failed");
    assert_eq!(response.status().as_u16(), 201);
    let question: Value = response.json().await.unwrap();

    (quiz_id, question["id"].as_i64().expect("question id"))
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/courses/{}/quizzes", address, COURSE_CODE))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = test_router().await;
    let forged = sign_jwt(ENROLLED[0], ROLE_STUDENT, "some_other_secret", 600).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/courses/{}/my-quizzes", COURSE_CODE))
                .header("Authorization", format!("Bearer {}", forged))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_and_ownership_are_enforced() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Students cannot author quizzes.
    let response = client
        .get(format!("{}/api/courses/{}/quizzes", address, COURSE_CODE))
        .bearer_auth(student_token(ENROLLED[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Faculty not in charge of the course.
    let response = client
        .get(format!("{}/api/courses/{}/quizzes", address, COURSE_CODE))
        .bearer_auth(faculty_token(OTHER_FACULTY_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "not_authorized");

    // Student not enrolled in the course.
    let response = client
        .get(format!("{}/api/courses/{}/my-quizzes", address, COURSE_CODE))
        .bearer_auth(student_token(NOT_ENROLLED))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn inverted_schedule_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let now = Utc::now();

    let response = client
        .post(format!("{}/api/courses/{}/quizzes", address, COURSE_CODE))
        .bearer_auth(faculty_token(FACULTY_ID))
        .json(&json!({
            "title": "Backwards",
            "start": now + Duration::hours(2),
            "end": now + Duration::hours(1)
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_schedule");
}

#[tokio::test]
async fn test_quiz_attempt_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (quiz_id, question_id) = open_quiz(&client, &address).await;
    let student = student_token(ENROLLED[0]);
    let quiz_url = format!("{}/api/courses/{}/quizzes/{}", address, COURSE_CODE, quiz_id);

    // 1. Gate says the attempt can start
    let status: Value = client
        .get(format!("{}/status", quiz_url))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["state"], "open");
    assert_eq!(status["can_attempt"], true);

    // 2. Paper hides the answer key
    let paper: Value = client
        .get(format!("{}/paper", quiz_url))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(paper["total_marks"], 5);
    assert!(paper["questions"][0].get("answer").is_none());

    // 3. Submit
    let submission = json!({ "answers": { question_id.to_string(): "B" } });
    let response = client
        .post(format!("{}/submit", quiz_url))
        .bearer_auth(&student)
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["marks_obtained"], 5);
    assert_eq!(result["percentage"], 100.0);

    // 4. Resubmission is refused and names the colliding question
    let response = client
        .post(format!("{}/submit", quiz_url))
        .bearer_auth(&student)
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "already_attempted");
    assert_eq!(body["question_ids"], json!([question_id]));

    // 5. Result before publishing keeps the key hidden
    let sheet: Value = client
        .get(format!("{}/result", quiz_url))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sheet["marks_obtained"], 5);
    assert_eq!(sheet["published"], false);
    assert!(sheet["answers"][0]["correct_option"].is_null());

    // 6. Instructor summary
    let summary: Value = client
        .get(format!("{}/summary", quiz_url))
        .bearer_auth(faculty_token(FACULTY_ID))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["attempted_count"], 1);
    assert_eq!(summary["total_students"], ENROLLED.len());
    assert_eq!(summary["questions"][0]["distribution"]["B"], 1);

    // 7. Publish twice, then the key is visible
    for _ in 0..2 {
        let response = client
            .post(format!("{}/publish", quiz_url))
            .bearer_auth(faculty_token(FACULTY_ID))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let sheet: Value = client
        .get(format!("{}/result", quiz_url))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sheet["published"], true);
    assert_eq!(sheet["answers"][0]["correct_option"], "B");
}

#[tokio::test]
async fn unknown_question_is_not_found() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (quiz_id, question_id) = open_quiz(&client, &address).await;

    let response = client
        .post(format!(
            "{}/api/courses/{}/quizzes/{}/submit",
            address, COURSE_CODE, quiz_id
        ))
        .bearer_auth(student_token(ENROLLED[1]))
        .json(&json!({ "answers": { (question_id + 100).to_string(): "A" } }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unknown_question");
}

#[tokio::test]
async fn quiz_from_another_course_is_unknown() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/courses/{}/quizzes/9999/status", address, COURSE_CODE))
        .bearer_auth(student_token(ENROLLED[0]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unknown_quiz");
}
