// src/services/attempt.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::types::Json;

use crate::error::{AppError, ConflictReason};
use crate::models::attempt::{AttemptAnswer, EvaluationAttempt, NewAttempt, SubmittedAnswer};
use crate::models::evaluation::Evaluation;
use crate::services::clock::Clock;
use crate::services::generator::generate_snapshot;
use crate::services::scorer::score_answers;
use crate::store::EngineStore;

/// Owns the attempt state machine: InProgress (no submitted_at) to Submitted
/// (submitted_at set, scored). Orchestrates eligibility, snapshot generation
/// and grading over the injected store and clock.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn EngineStore>,
    clock: Arc<dyn Clock>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn EngineStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Eligibility check: max-attempts quota and in-progress exclusivity.
    /// Read-only; the authoritative guard is the store's atomic claim in
    /// `create_attempt`.
    pub async fn can_attempt(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<(bool, Option<ConflictReason>), AppError> {
        let evaluation = self
            .store
            .get_evaluation(evaluation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".to_string()))?;

        let reason = self.eligibility(&evaluation, user_id).await?;
        Ok((reason.is_none(), reason))
    }

    /// Starts a new attempt: existence checks, eligibility, snapshot
    /// generation, then the atomic create.
    pub async fn start_attempt(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<EvaluationAttempt, AppError> {
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let evaluation = self
            .store
            .get_evaluation(evaluation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".to_string()))?;

        // A stale in-progress attempt whose time limit has lapsed is closed
        // out here so it stops blocking new starts.
        self.finalize_lapsed_attempt(&evaluation, user_id).await?;

        if let Some(reason) = self.eligibility(&evaluation, user_id).await? {
            return Err(AppError::Conflict(reason));
        }

        let pool = self.store.get_questions_for_evaluation(evaluation_id).await?;

        // Reseeded per call; exam randomization, not security-sensitive.
        let mut rng = StdRng::from_entropy();
        let snapshot = generate_snapshot(&evaluation, &pool, &mut rng)?;

        let attempt = self
            .store
            .create_attempt(NewAttempt {
                user_id,
                evaluation_id,
                questions: snapshot.questions,
                total_points: snapshot.total_points,
                started_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            attempt_id = attempt.id,
            user_id,
            evaluation_id,
            total_points = attempt.total_points,
            "attempt started"
        );

        Ok(attempt)
    }

    /// Submits answers for an in-progress attempt. Grades against the
    /// attempt's own snapshot and persists answers, score and timestamps in
    /// one write.
    pub async fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<EvaluationAttempt, AppError> {
        let mut attempt = self
            .store
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        if attempt.is_submitted() {
            return Err(AppError::Conflict(ConflictReason::AlreadySubmitted));
        }

        let evaluation = self
            .store
            .get_evaluation(attempt.evaluation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".to_string()))?;

        let now = self.clock.now();
        let elapsed_minutes = (now - attempt.started_at).num_minutes();
        if evaluation.time_limit_minutes > 0
            && elapsed_minutes > i64::from(evaluation.time_limit_minutes)
        {
            // The attempt is left untouched, not silently scored as zero.
            return Err(AppError::Conflict(ConflictReason::TimeLimitExceeded));
        }

        attempt.answers = Json(answers.into_iter().map(AttemptAnswer::from).collect());
        attempt.submitted_at = Some(now);
        attempt.time_spent_minutes = elapsed_minutes as i32;

        let outcome = score_answers(
            &attempt.questions,
            &mut attempt.answers,
            attempt.total_points,
            evaluation.passing_score,
        );
        attempt.score = outcome.score;
        attempt.passed = outcome.passed;

        self.store.update_attempt(&attempt).await?;

        tracing::info!(
            attempt_id,
            score = attempt.score,
            total_points = attempt.total_points,
            passed = attempt.passed,
            "attempt submitted"
        );

        Ok(attempt)
    }

    /// Idempotent re-score of an already-submitted attempt against its own
    /// snapshot.
    pub async fn score_attempt(&self, attempt_id: i64) -> Result<EvaluationAttempt, AppError> {
        let mut attempt = self
            .store
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        let evaluation = self
            .store
            .get_evaluation(attempt.evaluation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".to_string()))?;

        let outcome = score_answers(
            &attempt.questions,
            &mut attempt.answers,
            attempt.total_points,
            evaluation.passing_score,
        );
        attempt.score = outcome.score;
        attempt.passed = outcome.passed;

        self.store.update_attempt(&attempt).await?;

        Ok(attempt)
    }

    pub async fn get_attempt(&self, attempt_id: i64) -> Result<EvaluationAttempt, AppError> {
        self.store
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    /// Attempt history for a user on one evaluation, newest first.
    pub async fn user_attempts(
        &self,
        user_id: i64,
        evaluation_id: i64,
    ) -> Result<Vec<EvaluationAttempt>, AppError> {
        self.store.list_attempts(user_id, evaluation_id).await
    }

    /// Both checks run: an unlimited-attempts evaluation can still have a
    /// dangling in-progress attempt. A lapsed in-progress attempt is treated
    /// as if it were already finalized, which is what the next start will do.
    async fn eligibility(
        &self,
        evaluation: &Evaluation,
        user_id: i64,
    ) -> Result<Option<ConflictReason>, AppError> {
        let in_progress = self
            .store
            .get_in_progress_attempt(user_id, evaluation.id)
            .await?;
        let now = self.clock.now();
        let lapsed = in_progress
            .as_ref()
            .is_some_and(|attempt| has_lapsed(evaluation, attempt, now));

        if evaluation.max_attempts > 0 {
            let mut submitted = self
                .store
                .count_submitted_attempts(user_id, evaluation.id)
                .await?;
            if lapsed {
                submitted += 1;
            }
            if submitted >= i64::from(evaluation.max_attempts) {
                return Ok(Some(ConflictReason::MaxAttemptsReached));
            }
        }

        if in_progress.is_some() && !lapsed {
            return Ok(Some(ConflictReason::AttemptInProgress));
        }

        Ok(None)
    }

    /// Closes out an in-progress attempt whose time limit has lapsed: grades
    /// whatever answers it holds (normally none), caps the time spent at the
    /// limit and marks it submitted. Evaluations without a time limit have no
    /// lapse point, so their dangling attempts keep blocking.
    async fn finalize_lapsed_attempt(
        &self,
        evaluation: &Evaluation,
        user_id: i64,
    ) -> Result<(), AppError> {
        if evaluation.time_limit_minutes <= 0 {
            return Ok(());
        }

        let Some(mut attempt) = self
            .store
            .get_in_progress_attempt(user_id, evaluation.id)
            .await?
        else {
            return Ok(());
        };

        let now = self.clock.now();
        if !has_lapsed(evaluation, &attempt, now) {
            return Ok(());
        }

        tracing::info!(
            attempt_id = attempt.id,
            user_id,
            evaluation_id = evaluation.id,
            "finalizing lapsed attempt"
        );

        let outcome = score_answers(
            &attempt.questions,
            &mut attempt.answers,
            attempt.total_points,
            evaluation.passing_score,
        );
        attempt.score = outcome.score;
        attempt.passed = outcome.passed;
        attempt.submitted_at = Some(now);
        attempt.time_spent_minutes = evaluation.time_limit_minutes;

        self.store.update_attempt(&attempt).await
    }
}

fn has_lapsed(evaluation: &Evaluation, attempt: &EvaluationAttempt, now: DateTime<Utc>) -> bool {
    evaluation.time_limit_minutes > 0
        && (now - attempt.started_at).num_minutes() > i64::from(evaluation.time_limit_minutes)
}
