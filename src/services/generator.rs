// src/services/generator.rs

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::AppError;
use crate::models::attempt::{AttemptAnswerOption, AttemptQuestion};
use crate::models::evaluation::Evaluation;
use crate::models::question::{Answer, Question, QuestionType};

/// Result of snapshot generation: the frozen questions for one attempt and
/// the maximum score they are worth.
#[derive(Debug)]
pub struct GeneratedSnapshot {
    pub questions: Vec<AttemptQuestion>,
    pub total_points: i32,
}

/// Builds the immutable question snapshot for a new attempt.
///
/// Selection is a Fisher-Yates shuffle over a copy of the pool followed by
/// taking a prefix; when the pool is exactly the requested size the shuffle
/// is skipped and the pool order is kept. A question whose answer pool cannot
/// produce a valid option set is skipped with a warning and the next shuffled
/// candidate takes its place, so the snapshot still reaches the configured
/// question count whenever enough eligible questions exist.
///
/// The caller provides the random source; production reseeds from entropy on
/// every call, tests pass a seeded `StdRng`.
pub fn generate_snapshot(
    evaluation: &Evaluation,
    pool: &[Question],
    rng: &mut impl Rng,
) -> Result<GeneratedSnapshot, AppError> {
    let requested = evaluation.question_count.max(0) as usize;

    if pool.len() < requested {
        return Err(AppError::Validation(format!(
            "insufficient questions available: need {}, have {}",
            requested,
            pool.len()
        )));
    }

    let mut candidates: Vec<&Question> = pool.iter().collect();
    if candidates.len() > requested {
        candidates.shuffle(rng);
    }

    let mut questions: Vec<AttemptQuestion> = Vec::with_capacity(requested);
    let mut total_points = 0;

    for question in candidates {
        if questions.len() == requested {
            break;
        }

        let options = match generate_answer_options(
            &question.answers,
            evaluation.answer_options_count,
            question.question_type,
            rng,
        ) {
            Ok(options) => options,
            Err(reason) => {
                tracing::warn!(
                    question_id = question.id,
                    "skipping question during snapshot generation: {}",
                    reason
                );
                continue;
            }
        };

        questions.push(AttemptQuestion {
            // Sequential id scoped to this attempt, in selection order.
            id: questions.len() as u32 + 1,
            text: question.text.clone(),
            question_type: question.question_type,
            explanation: question.explanation.clone(),
            points: question.points,
            original_id: question.id,
            answer_options: options,
        });
        total_points += question.points;
    }

    if questions.is_empty() {
        return Err(AppError::Validation(
            "failed to generate any valid questions".to_string(),
        ));
    }

    if questions.len() < requested {
        tracing::warn!(
            evaluation_id = evaluation.id,
            generated = questions.len(),
            requested,
            "snapshot is short of the configured question count"
        );
    }

    Ok(GeneratedSnapshot {
        questions,
        total_points,
    })
}

/// Generates the shuffled option set for one snapshot question.
///
/// Single-choice questions expose exactly one correct option. Multiple-choice
/// questions expose a correct count drawn uniformly from
/// `[1, min(options_count - 1, available correct answers)]`. The remainder of
/// the set is filled with incorrect answers; if too few exist the set simply
/// comes out shorter than `options_count`.
fn generate_answer_options(
    answers: &[Answer],
    options_count: i32,
    question_type: QuestionType,
    rng: &mut impl Rng,
) -> Result<Vec<AttemptAnswerOption>, String> {
    if answers.len() < 2 {
        return Err(format!(
            "needs at least 2 candidate answers, has {}",
            answers.len()
        ));
    }

    let (mut correct, mut incorrect): (Vec<&Answer>, Vec<&Answer>) =
        answers.iter().partition(|a| a.is_correct);

    if correct.is_empty() {
        return Err("no correct answer available".to_string());
    }

    let options_count = options_count.max(0) as usize;

    let correct_count = match question_type {
        QuestionType::SingleChoice => 1,
        QuestionType::MultipleChoice => {
            let upper = options_count.saturating_sub(1).max(1).min(correct.len());
            if upper > 1 { rng.gen_range(1..=upper) } else { 1 }
        }
    };
    let incorrect_count = options_count
        .saturating_sub(correct_count)
        .min(incorrect.len());

    // Truncated Fisher-Yates on each subset.
    let (picked_correct, _) = correct.partial_shuffle(rng, correct_count);
    let (picked_incorrect, _) = incorrect.partial_shuffle(rng, incorrect_count);

    let mut options: Vec<AttemptAnswerOption> = picked_correct
        .iter()
        .chain(picked_incorrect.iter())
        .map(|answer| AttemptAnswerOption {
            id: 0,
            text: answer.text.clone(),
            is_correct: answer.is_correct,
        })
        .collect();

    // Shuffle the combined set so correct options are not positionally
    // predictable, then assign ids in final order.
    options.shuffle(rng);
    for (index, option) in options.iter_mut().enumerate() {
        option.id = index as u32 + 1;
    }

    Ok(options)
}
