// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Question kind. Stored as the `question_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
}

/// Represents one row of the 'answers' table: an authored answer option.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    pub position: i32,
}

/// Represents the 'questions' table: an authored question owned by an
/// evaluation. Authors may edit questions and answers at any time; attempts
/// never reference these rows directly once their snapshot exists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub evaluation_id: i64,

    /// The text content of the question.
    pub text: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Explanation shown to the user after submission.
    pub explanation: String,

    pub points: i32,
    pub position: i32,

    /// Answer pool, loaded by the store alongside the question.
    #[sqlx(skip)]
    pub answers: Vec<Answer>,
}
