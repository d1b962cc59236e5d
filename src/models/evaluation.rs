// src/models/evaluation.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'evaluations' table: the per-module exam configuration
/// the attempt engine reads when generating and grading attempts.
///
/// `max_attempts == 0` and `time_limit_minutes == 0` both mean "unlimited".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub module_id: i64,

    /// Display position within the module.
    pub position: i32,

    pub title: String,
    pub description: Option<String>,

    /// How many questions to draw from the pool per attempt.
    pub question_count: i32,

    /// How many answer options to offer per generated question.
    pub answer_options_count: i32,

    /// Percentage threshold (0-100) of awarded over total points.
    pub passing_score: i32,

    pub max_attempts: i32,
    pub time_limit_minutes: i32,
}
