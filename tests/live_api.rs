// tests/live_api.rs
//
// Smoke tests against a real server backed by Postgres. These need a running
// database (DATABASE_URL), so they are ignored by default:
//
//   DATABASE_URL=postgres://... cargo test --test live_api -- --ignored

use std::sync::Arc;

use lms_backend::config::Config;
use lms_backend::routes;
use lms_backend::services::{AttemptService, SystemClock};
use lms_backend::state::AppState;
use lms_backend::store::PgStore;
use sqlx::postgres::PgPoolOptions;

/// Spawns the app on a random port and returns the base URL.
async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        rust_log: "error".to_string(),
    };

    let attempts = AttemptService::new(Arc::new(PgStore::new(pool)), Arc::new(SystemClock));
    let state = AppState { config, attempts };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

#[tokio::test]
#[ignore]
async fn unknown_route_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn can_attempt_on_a_missing_evaluation_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{}/api/v1/users/1/evaluations/999999/can-attempt",
            address
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn starting_an_attempt_for_a_missing_user_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/attempts/start", address))
        .json(&serde_json::json!({ "user_id": 999999, "evaluation_id": 999999 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}
