// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::quiz, state::AppState, utils::jwt::auth_middleware};

/// Assembles the main application router.
///
/// * Faculty routes: authoring, publishing and the class summary.
/// * Student routes: listing, attempt gate, paper, submission and result.
/// * Every route sits behind the bearer-token middleware; the role is
///   checked by the `FacultyPrincipal`/`StudentPrincipal` extractors.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let faculty_routes = Router::new()
        .route(
            "/{code}/quizzes",
            get(quiz::list_quizzes).post(quiz::create_quiz),
        )
        .route("/{code}/quizzes/{quiz_id}", put(quiz::update_quiz))
        .route(
            "/{code}/quizzes/{quiz_id}/questions",
            post(quiz::add_question),
        )
        .route("/{code}/quizzes/{quiz_id}/publish", post(quiz::publish_quiz))
        .route("/{code}/quizzes/{quiz_id}/summary", get(quiz::quiz_summary));

    let student_routes = Router::new()
        .route("/{code}/my-quizzes", get(quiz::my_quizzes))
        .route("/{code}/quizzes/{quiz_id}/status", get(quiz::attempt_status))
        .route("/{code}/quizzes/{quiz_id}/paper", get(quiz::quiz_paper))
        .route("/{code}/quizzes/{quiz_id}/submit", post(quiz::submit_answers))
        .route("/{code}/quizzes/{quiz_id}/result", get(quiz::quiz_result));

    let course_routes = faculty_routes
        .merge(student_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/courses", course_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
