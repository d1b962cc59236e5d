// src/store/mod.rs

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::attempt::{EvaluationAttempt, NewAttempt};
use crate::models::evaluation::Evaluation;
use crate::models::question::Question;

/// Narrow persistence interface consumed by the attempt engine. Everything
/// else about storage (course/module CRUD, enrollment bookkeeping) lives
/// behind other services and is invisible here.
#[async_trait]
pub trait EngineStore: Send + Sync {
    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError>;

    /// All authored questions for an evaluation, each with its answer pool.
    async fn get_questions_for_evaluation(
        &self,
        evaluation_id: i64,
    ) -> Result<Vec<Question>, AppError>;

    async fn user_exists(&self, id: i64) -> Result<bool, AppError>;

    /// Persists a new in-progress attempt and returns it with its id.
    ///
    /// This is the atomic claim on "one in-progress attempt per
    /// (user, evaluation)": implementations must reject a second concurrent
    /// insert with `Conflict(attempt_in_progress)` even when the caller's
    /// eligibility check raced past another start. The in-process check in
    /// the service is a fast path, not the correctness boundary.
    async fn create_attempt(&self, attempt: NewAttempt) -> Result<EvaluationAttempt, AppError>;

    async fn get_attempt(&self, id: i64) -> Result<Option<EvaluationAttempt>, AppError>;

    /// Writes the mutable attempt fields (answers, score, passed,
    /// submitted_at, time_spent) in a single update. The question snapshot
    /// is never rewritten.
    async fn update_attempt(&self, attempt: &EvaluationAttempt) -> Result<(), AppError>;

    async fn count_submitted_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<i64, AppError>;

    async fn get_in_progress_attempt(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Option<EvaluationAttempt>, AppError>;

    async fn list_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Vec<EvaluationAttempt>, AppError>;
}
