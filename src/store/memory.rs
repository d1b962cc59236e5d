// src/store/memory.rs

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::types::Json;

use crate::error::{AppError, ConflictReason};
use crate::models::attempt::{EvaluationAttempt, NewAttempt};
use crate::models::evaluation::Evaluation;
use crate::models::question::Question;
use crate::store::EngineStore;

/// In-memory store used by the test suites and for running the engine
/// without a database. Mirrors the Postgres semantics, including the atomic
/// one-in-progress-attempt claim: the check-and-insert in `create_attempt`
/// happens under a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<i64>,
    evaluations: HashMap<i64, Evaluation>,
    questions: HashMap<i64, Vec<Question>>,
    attempts: Vec<EvaluationAttempt>,
    next_attempt_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: i64) {
        self.inner.lock().unwrap().users.push(id);
    }

    pub fn add_evaluation(&self, evaluation: Evaluation) {
        self.inner
            .lock()
            .unwrap()
            .evaluations
            .insert(evaluation.id, evaluation);
    }

    pub fn add_question(&self, question: Question) {
        self.inner
            .lock()
            .unwrap()
            .questions
            .entry(question.evaluation_id)
            .or_default()
            .push(question);
    }
}

#[async_trait]
impl EngineStore for MemoryStore {
    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        Ok(self.inner.lock().unwrap().evaluations.get(&id).cloned())
    }

    async fn get_questions_for_evaluation(
        &self,
        evaluation_id: i64,
    ) -> Result<Vec<Question>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .questions
            .get(&evaluation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.lock().unwrap().users.contains(&id))
    }

    async fn create_attempt(&self, attempt: NewAttempt) -> Result<EvaluationAttempt, AppError> {
        let mut inner = self.inner.lock().unwrap();

        let already_open = inner.attempts.iter().any(|a| {
            a.user_id == attempt.user_id
                && a.evaluation_id == attempt.evaluation_id
                && a.submitted_at.is_none()
        });
        if already_open {
            return Err(AppError::Conflict(ConflictReason::AttemptInProgress));
        }

        inner.next_attempt_id += 1;
        let created = EvaluationAttempt {
            id: inner.next_attempt_id,
            user_id: attempt.user_id,
            evaluation_id: attempt.evaluation_id,
            questions: Json(attempt.questions),
            answers: Json(Vec::new()),
            score: 0,
            total_points: attempt.total_points,
            passed: false,
            started_at: attempt.started_at,
            submitted_at: None,
            time_spent_minutes: 0,
        };
        inner.attempts.push(created.clone());

        Ok(created)
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<EvaluationAttempt>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn update_attempt(&self, attempt: &EvaluationAttempt) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt.id)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        // The snapshot is deliberately left untouched.
        stored.answers = attempt.answers.clone();
        stored.score = attempt.score;
        stored.passed = attempt.passed;
        stored.submitted_at = attempt.submitted_at;
        stored.time_spent_minutes = attempt.time_spent_minutes;

        Ok(())
    }

    async fn count_submitted_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<i64, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .filter(|a| {
                a.user_id == user_id
                    && a.evaluation_id == evaluation_id
                    && a.submitted_at.is_some()
            })
            .count() as i64)
    }

    async fn get_in_progress_attempt(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Option<EvaluationAttempt>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .find(|a| {
                a.user_id == user_id
                    && a.evaluation_id == evaluation_id
                    && a.submitted_at.is_none()
            })
            .cloned())
    }

    async fn list_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Vec<EvaluationAttempt>, AppError> {
        let mut attempts: Vec<EvaluationAttempt> = self
            .inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.evaluation_id == evaluation_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(attempts)
    }
}
