// src/handlers/attempt.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::attempt::{AttemptView, StartAttemptRequest, SubmitAttemptRequest},
    services::AttemptService,
};

/// Response body for the eligibility endpoint.
#[derive(Debug, Serialize)]
pub struct CanAttemptResponse {
    pub can_attempt: bool,
    pub reason: Option<&'static str>,
}

/// Starts a new attempt for a user on an evaluation.
///
/// Returns 201 with the generated attempt. The correctness flags of the
/// snapshot options are withheld until the attempt is submitted.
pub async fn start_attempt(
    State(attempts): State<AttemptService>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let attempt = attempts
        .start_attempt(payload.user_id, payload.evaluation_id)
        .await?;

    Ok((StatusCode::CREATED, Json(AttemptView::from(&attempt))))
}

/// Submits answers for an in-progress attempt and returns the graded result.
pub async fn submit_attempt(
    State(attempts): State<AttemptService>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let attempt = attempts.submit_attempt(id, payload.answers).await?;

    Ok(Json(AttemptView::from(&attempt)))
}

/// Re-scores an already-submitted attempt. Idempotent.
pub async fn score_attempt(
    State(attempts): State<AttemptService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts.score_attempt(id).await?;

    Ok(Json(AttemptView::from(&attempt)))
}

/// Fetches one attempt by id.
pub async fn get_attempt(
    State(attempts): State<AttemptService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts.get_attempt(id).await?;

    Ok(Json(AttemptView::from(&attempt)))
}

/// Lists a user's attempts on an evaluation, newest first.
pub async fn get_user_attempts(
    State(attempts): State<AttemptService>,
    Path((user_id, evaluation_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let records = attempts.user_attempts(user_id, evaluation_id).await?;
    let views: Vec<AttemptView> = records.iter().map(AttemptView::from).collect();

    Ok(Json(views))
}

/// Reports whether a user may start a new attempt, and why not if they may
/// not. Read-only.
pub async fn can_attempt(
    State(attempts): State<AttemptService>,
    Path((user_id, evaluation_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (allowed, reason) = attempts.can_attempt(user_id, evaluation_id).await?;

    Ok(Json(CanAttemptResponse {
        can_attempt: allowed,
        reason: reason.map(|r| r.as_str()),
    }))
}
