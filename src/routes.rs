// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::attempt, state::AppState};

/// Assembles the main application router.
///
/// * Mounts the attempt-engine routes under /api/v1.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (attempt service + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let attempt_routes = Router::new()
        .route("/start", post(attempt::start_attempt))
        .route("/{id}", get(attempt::get_attempt))
        .route("/{id}/submit", post(attempt::submit_attempt))
        .route("/{id}/score", post(attempt::score_attempt));

    let user_evaluation_routes = Router::new()
        .route(
            "/{user_id}/evaluations/{evaluation_id}/attempts",
            get(attempt::get_user_attempts),
        )
        .route(
            "/{user_id}/evaluations/{evaluation_id}/can-attempt",
            get(attempt::can_attempt),
        );

    Router::new()
        .nest("/api/v1/attempts", attempt_routes)
        .nest("/api/v1/users", user_evaluation_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
