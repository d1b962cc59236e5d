// src/services/scorer.rs

use std::collections::{HashMap, HashSet};

use crate::models::attempt::{AttemptAnswer, AttemptQuestion};
use crate::models::question::QuestionType;

/// Aggregate result of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub score: i32,
    pub passed: bool,
}

/// Grades a submission against the attempt's own snapshot, never against the
/// live question pool. Writes `is_correct`/`points` into the answer entries
/// and returns the total; the snapshot itself is read-only here.
///
/// An answer referencing an unknown snapshot question id is skipped (stale or
/// foreign id) rather than failing the submission.
pub fn score_answers(
    snapshot: &[AttemptQuestion],
    answers: &mut [AttemptAnswer],
    total_points: i32,
    passing_score: i32,
) -> ScoreOutcome {
    let questions: HashMap<u32, &AttemptQuestion> =
        snapshot.iter().map(|q| (q.id, q)).collect();

    let mut score = 0;
    for answer in answers.iter_mut() {
        let Some(question) = questions.get(&answer.attempt_question_id) else {
            tracing::warn!(
                attempt_question_id = answer.attempt_question_id,
                "submitted answer does not match any snapshot question"
            );
            continue;
        };

        let (is_correct, points) = grade_answer(question, &answer.selected_option_ids);
        answer.is_correct = is_correct;
        answer.points = points;
        score += points;
    }

    let passed = if total_points > 0 {
        let percentage = f64::from(score) / f64::from(total_points) * 100.0;
        percentage >= f64::from(passing_score)
    } else {
        false
    };

    ScoreOutcome { score, passed }
}

/// All-or-nothing grading of one answer. Single choice requires exactly one
/// selected option and it must be correct; multiple choice requires the
/// selected set to equal the snapshot's correct set.
fn grade_answer(question: &AttemptQuestion, selected_option_ids: &[u32]) -> (bool, i32) {
    if selected_option_ids.is_empty() {
        return (false, 0);
    }

    let correct_ids: HashSet<u32> = question
        .answer_options
        .iter()
        .filter(|option| option.is_correct)
        .map(|option| option.id)
        .collect();

    match question.question_type {
        QuestionType::SingleChoice => {
            if selected_option_ids.len() != 1 {
                return (false, 0);
            }
            if correct_ids.contains(&selected_option_ids[0]) {
                (true, question.points)
            } else {
                (false, 0)
            }
        }
        QuestionType::MultipleChoice => {
            let selected: HashSet<u32> = selected_option_ids.iter().copied().collect();
            if selected == correct_ids {
                (true, question.points)
            } else {
                (false, 0)
            }
        }
    }
}
