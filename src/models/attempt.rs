// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use validator::Validate;

use crate::models::question::QuestionType;

/// One answer option generated for a snapshot question. The id is ephemeral:
/// it is only meaningful within the owning attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptAnswerOption {
    pub id: u32,
    pub text: String,
    pub is_correct: bool,
}

/// One question frozen into an attempt's snapshot. Carries a copy of the
/// authored text and points plus the original question id for traceability;
/// later edits to the authored question do not reach this copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptQuestion {
    pub id: u32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub explanation: String,
    pub points: i32,
    pub original_id: i64,
    pub answer_options: Vec<AttemptAnswerOption>,
}

/// One submitted answer. `attempt_question_id` and `selected_option_ids`
/// reference the snapshot's ephemeral ids. `is_correct` and `points` are
/// written only by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub attempt_question_id: u32,
    pub selected_option_ids: Vec<u32>,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points: i32,
}

/// Represents the 'evaluation_attempts' table: one instance of a user taking
/// an evaluation. The question snapshot is written once at start time and is
/// never mutated afterwards; the submission fields are written exactly once
/// at submit time. Attempts are retained for audit and are never deleted.
///
/// `submitted_at == None` means the attempt is still in progress.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EvaluationAttempt {
    pub id: i64,
    pub user_id: i64,
    pub evaluation_id: i64,

    /// Immutable question snapshot. Stored as JSONB; the Json wrapper keeps
    /// serialization at the storage boundary only.
    pub questions: Json<Vec<AttemptQuestion>>,

    /// The user's submission, with per-answer scoring results.
    pub answers: Json<Vec<AttemptAnswer>>,

    pub score: i32,
    pub total_points: i32,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: i32,
}

impl EvaluationAttempt {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}

/// Attempt fields known before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub evaluation_id: i64,
    pub questions: Vec<AttemptQuestion>,
    pub total_points: i32,
    pub started_at: DateTime<Utc>,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(range(min = 1, message = "user_id must be positive."))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "evaluation_id must be positive."))]
    pub evaluation_id: i64,
}

/// One answer as submitted by the client. Scoring fields are not accepted
/// from the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub attempt_question_id: u32,
    #[serde(default)]
    pub selected_option_ids: Vec<u32>,
}

impl From<SubmittedAnswer> for AttemptAnswer {
    fn from(submitted: SubmittedAnswer) -> Self {
        AttemptAnswer {
            attempt_question_id: submitted.attempt_question_id,
            selected_option_ids: submitted.selected_option_ids,
            is_correct: false,
            points: 0,
        }
    }
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(max = 500, message = "Too many answers."))]
    pub answers: Vec<SubmittedAnswer>,
}

/// DTO for returning an attempt to the client (the analogue of hiding the
/// answer key on authored questions). While the attempt is in progress the
/// correctness flags and explanations are withheld; once submitted the full
/// record is exposed.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: i64,
    pub user_id: i64,
    pub evaluation_id: i64,
    pub questions: Vec<AttemptQuestionView>,
    pub answers: Vec<AttemptAnswer>,
    pub score: i32,
    pub total_points: i32,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct AttemptQuestionView {
    pub id: u32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub points: i32,
    pub original_id: i64,
    pub answer_options: Vec<AttemptOptionView>,
}

#[derive(Debug, Serialize)]
pub struct AttemptOptionView {
    pub id: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl From<&EvaluationAttempt> for AttemptView {
    fn from(attempt: &EvaluationAttempt) -> Self {
        let reveal = attempt.is_submitted();

        let questions = attempt
            .questions
            .iter()
            .map(|question| AttemptQuestionView {
                id: question.id,
                text: question.text.clone(),
                question_type: question.question_type,
                explanation: reveal.then(|| question.explanation.clone()),
                points: question.points,
                original_id: question.original_id,
                answer_options: question
                    .answer_options
                    .iter()
                    .map(|option| AttemptOptionView {
                        id: option.id,
                        text: option.text.clone(),
                        is_correct: reveal.then_some(option.is_correct),
                    })
                    .collect(),
            })
            .collect();

        AttemptView {
            id: attempt.id,
            user_id: attempt.user_id,
            evaluation_id: attempt.evaluation_id,
            questions,
            answers: attempt.answers.to_vec(),
            score: attempt.score,
            total_points: attempt.total_points,
            passed: attempt.passed,
            started_at: attempt.started_at,
            submitted_at: attempt.submitted_at,
            time_spent_minutes: attempt.time_spent_minutes,
        }
    }
}
