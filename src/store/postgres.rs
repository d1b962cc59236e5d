// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::{AppError, ConflictReason};
use crate::models::attempt::{EvaluationAttempt, NewAttempt};
use crate::models::evaluation::Evaluation;
use crate::models::question::{Answer, Question};
use crate::store::EngineStore;

const ATTEMPT_COLUMNS: &str = "id, user_id, evaluation_id, questions, answers, score, \
     total_points, passed, started_at, submitted_at, time_spent_minutes";

/// Postgres-backed store. Attempt snapshots and submissions live in JSONB
/// columns; the partial unique index `ux_eval_attempts_in_progress` is what
/// actually enforces the one-in-progress-attempt rule under concurrency.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngineStore for PgStore {
    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        let evaluation = sqlx::query_as::<_, Evaluation>(
            "SELECT id, module_id, position, title, description, question_count, \
                    answer_options_count, passing_score, max_attempts, time_limit_minutes \
             FROM evaluations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(evaluation)
    }

    async fn get_questions_for_evaluation(
        &self,
        evaluation_id: i64,
    ) -> Result<Vec<Question>, AppError> {
        let mut questions = sqlx::query_as::<_, Question>(
            "SELECT id, evaluation_id, text, question_type, explanation, points, position \
             FROM questions WHERE evaluation_id = $1 ORDER BY position, id",
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        if questions.is_empty() {
            return Ok(questions);
        }

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let answers = sqlx::query_as::<_, Answer>(
            "SELECT id, question_id, text, is_correct, position \
             FROM answers WHERE question_id = ANY($1) ORDER BY position, id",
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
        for answer in answers {
            by_question.entry(answer.question_id).or_default().push(answer);
        }
        for question in &mut questions {
            question.answers = by_question.remove(&question.id).unwrap_or_default();
        }

        Ok(questions)
    }

    async fn user_exists(&self, id: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create_attempt(&self, attempt: NewAttempt) -> Result<EvaluationAttempt, AppError> {
        let created = sqlx::query_as::<_, EvaluationAttempt>(&format!(
            "INSERT INTO evaluation_attempts \
                 (user_id, evaluation_id, questions, answers, score, total_points, \
                  passed, started_at, submitted_at, time_spent_minutes) \
             VALUES ($1, $2, $3, '[]'::jsonb, 0, $4, FALSE, $5, NULL, 0) \
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(attempt.user_id)
        .bind(attempt.evaluation_id)
        .bind(Json(&attempt.questions))
        .bind(attempt.total_points)
        .bind(attempt.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(ConflictReason::AttemptInProgress)
            }
            _ => AppError::from(e),
        })?;

        Ok(created)
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<EvaluationAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, EvaluationAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM evaluation_attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn update_attempt(&self, attempt: &EvaluationAttempt) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE evaluation_attempts \
             SET answers = $2, score = $3, passed = $4, submitted_at = $5, \
                 time_spent_minutes = $6 \
             WHERE id = $1",
        )
        .bind(attempt.id)
        .bind(&attempt.answers)
        .bind(attempt.score)
        .bind(attempt.passed)
        .bind(attempt.submitted_at)
        .bind(attempt.time_spent_minutes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_submitted_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM evaluation_attempts \
             WHERE user_id = $1 AND evaluation_id = $2 AND submitted_at IS NOT NULL",
        )
        .bind(user_id)
        .bind(evaluation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_in_progress_attempt(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Option<EvaluationAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, EvaluationAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM evaluation_attempts \
             WHERE user_id = $1 AND evaluation_id = $2 AND submitted_at IS NULL"
        ))
        .bind(user_id)
        .bind(evaluation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn list_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Vec<EvaluationAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, EvaluationAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM evaluation_attempts \
             WHERE user_id = $1 AND evaluation_id = $2 ORDER BY started_at DESC"
        ))
        .bind(user_id)
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }
}
