// tests/http_api.rs
//
// Router-level tests driven through tower's oneshot, with the engine wired
// to the in-memory store. No network, no database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use lms_backend::config::Config;
use lms_backend::models::evaluation::Evaluation;
use lms_backend::models::question::{Answer, Question, QuestionType};
use lms_backend::routes::create_router;
use lms_backend::services::{AttemptService, ManualClock};
use lms_backend::state::AppState;
use lms_backend::store::MemoryStore;
use tower::ServiceExt;

const USER_ID: i64 = 1;
const EVALUATION_ID: i64 = 10;

fn test_app() -> (Router, AttemptService) {
    let store = Arc::new(MemoryStore::new());
    store.add_user(USER_ID);
    store.add_evaluation(Evaluation {
        id: EVALUATION_ID,
        module_id: 1,
        position: 0,
        title: "Final exam".to_string(),
        description: None,
        question_count: 2,
        answer_options_count: 4,
        passing_score: 50,
        max_attempts: 0,
        time_limit_minutes: 0,
    });
    for id in 1..=4 {
        let mut answers = vec![Answer {
            id: id * 100,
            question_id: id,
            text: "right".to_string(),
            is_correct: true,
            position: 0,
        }];
        for i in 1..4 {
            answers.push(Answer {
                id: id * 100 + i,
                question_id: id,
                text: format!("wrong {i}"),
                is_correct: false,
                position: i as i32,
            });
        }
        store.add_question(Question {
            id,
            evaluation_id: EVALUATION_ID,
            text: format!("question {id}"),
            question_type: QuestionType::SingleChoice,
            explanation: "explained".to_string(),
            points: 10,
            position: id as i32,
            answers,
        });
    }

    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap());
    let attempts = AttemptService::new(store, Arc::new(clock));

    let state = AppState {
        config: Config {
            database_url: "postgres://unused".to_string(),
            rust_log: "error".to_string(),
        },
        attempts: attempts.clone(),
    };

    (create_router(state), attempts)
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

#[tokio::test]
async fn starting_an_attempt_returns_201_without_leaking_the_answer_key() {
    let (app, _) = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/attempts/start",
        Some(serde_json::json!({ "user_id": USER_ID, "evaluation_id": EVALUATION_ID })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_points"], 20);
    assert!(body["submitted_at"].is_null());

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        assert!(question.get("explanation").is_none());
        for option in question["answer_options"].as_array().unwrap() {
            assert!(option.get("is_correct").is_none());
            assert!(option["text"].is_string());
        }
    }
}

#[tokio::test]
async fn submitting_reveals_grading_and_the_answer_key() {
    let (app, attempts) = test_app();

    let (status, started) = send_json(
        &app,
        "POST",
        "/api/v1/attempts/start",
        Some(serde_json::json!({ "user_id": USER_ID, "evaluation_id": EVALUATION_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let attempt_id = started["id"].as_i64().unwrap();

    // Read the correct option ids through the service; the HTTP view hides
    // them while the attempt is open.
    let snapshot = attempts.get_attempt(attempt_id).await.unwrap();
    let answers: Vec<serde_json::Value> = snapshot
        .questions
        .iter()
        .map(|question| {
            let correct: Vec<u32> = question
                .answer_options
                .iter()
                .filter(|option| option.is_correct)
                .map(|option| option.id)
                .collect();
            serde_json::json!({
                "attempt_question_id": question.id,
                "selected_option_ids": correct,
            })
        })
        .collect();

    let (status, graded) = send_json(
        &app,
        "POST",
        &format!("/api/v1/attempts/{attempt_id}/submit"),
        Some(serde_json::json!({ "answers": answers })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["score"], 20);
    assert_eq!(graded["passed"], true);
    assert!(graded["submitted_at"].is_string());
    for question in graded["questions"].as_array().unwrap() {
        assert!(question["explanation"].is_string());
        for option in question["answer_options"].as_array().unwrap() {
            assert!(option["is_correct"].is_boolean());
        }
    }
    for answer in graded["answers"].as_array().unwrap() {
        assert_eq!(answer["is_correct"], true);
        assert_eq!(answer["points"], 10);
    }
}

#[tokio::test]
async fn a_second_start_conflicts_with_a_reason_code() {
    let (app, _) = test_app();
    let payload = serde_json::json!({ "user_id": USER_ID, "evaluation_id": EVALUATION_ID });

    let (status, _) = send_json(&app, "POST", "/api/v1/attempts/start", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, "POST", "/api/v1/attempts/start", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "attempt_in_progress");
}

#[tokio::test]
async fn can_attempt_reports_eligibility() {
    let (app, _) = test_app();
    let uri = format!("/api/v1/users/{USER_ID}/evaluations/{EVALUATION_ID}/can-attempt");

    let (status, body) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_attempt"], true);
    assert!(body["reason"].is_null());

    send_json(
        &app,
        "POST",
        "/api/v1/attempts/start",
        Some(serde_json::json!({ "user_id": USER_ID, "evaluation_id": EVALUATION_ID })),
    )
    .await;

    let (status, body) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_attempt"], false);
    assert_eq!(body["reason"], "attempt_in_progress");
}

#[tokio::test]
async fn unknown_attempt_returns_404() {
    let (app, _) = test_app();

    let (status, _) = send_json(&app, "GET", "/api/v1/attempts/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_start_payload_returns_400() {
    let (app, _) = test_app();

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/attempts/start",
        Some(serde_json::json!({ "user_id": 0, "evaluation_id": EVALUATION_ID })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attempt_history_endpoint_lists_attempts() {
    let (app, attempts) = test_app();

    let started = attempts.start_attempt(USER_ID, EVALUATION_ID).await.unwrap();
    let submission: Vec<lms_backend::models::attempt::SubmittedAnswer> = Vec::new();
    attempts.submit_attempt(started.id, submission).await.unwrap();

    let uri = format!("/api/v1/users/{USER_ID}/evaluations/{EVALUATION_ID}/attempts");
    let (status, body) = send_json(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["score"], 0);
    assert_eq!(history[0]["passed"], false);
}
