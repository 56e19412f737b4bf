//! Grading Engine: submitted answers against a persisted quiz.
//!
//! Grading is pure and deterministic. Correctness is exact string equality
//! after trimming leading and trailing whitespace on both sides; there is
//! no case folding and no numeric or synonym normalization, so `" Paris "`
//! matches `"Paris"` but `"paris"` does not. Answers referencing question
//! ids not present in the quiz are skipped silently.
//!
//! The engine also decides whether this submission warrants a wrong-answer
//! note. Remediation quizzes never spawn notes, which keeps remediation
//! from chaining onto itself.

use crate::model::{Quiz, QuizResultDraft, UserAnswer, WrongAnswerItem};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One answer in a submission, matched to a question by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer: String,
}

/// The graded outcome of one submission, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedSubmission {
    pub result: QuizResultDraft,
    /// Snapshots of every incorrectly answered question.
    pub wrong_items: Vec<WrongAnswerItem>,
    /// Whether a wrong-answer note should be recorded for this result.
    pub needs_note: bool,
}

/// Grade a submission. Score is the rounded percentage of quiz questions
/// answered correctly; a zero-question quiz scores 0.
pub fn grade(quiz: &Quiz, answers: &[SubmittedAnswer]) -> GradedSubmission {
    let total = quiz.questions.len();
    let mut rows: Vec<UserAnswer> = Vec::with_capacity(answers.len());
    let mut wrong_items: Vec<WrongAnswerItem> = Vec::new();

    for submitted in answers {
        let Some(question) = quiz.find_question(submitted.question_id) else {
            debug!(
                "Skipping answer for question {} not in this quiz",
                submitted.question_id
            );
            continue;
        };

        let is_correct = submitted.selected_answer.trim() == question.answer.trim();
        rows.push(UserAnswer {
            question_id: question.id,
            selected_answer: submitted.selected_answer.clone(),
            is_correct,
        });

        if !is_correct {
            wrong_items.push(WrongAnswerItem {
                question_id: question.id,
                question_text: question.text.clone(),
                user_answer: submitted.selected_answer.clone(),
                correct_answer: question.answer.clone(),
                explanation: question.explanation.clone(),
                source_context: question.source_context.clone(),
                page: 0,
            });
        }
    }

    let correct = rows.iter().filter(|r| r.is_correct).count();
    let score = if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as u8
    };

    let needs_note = !wrong_items.is_empty() && !quiz.is_regenerated;

    GradedSubmission {
        result: QuizResultDraft {
            quiz_id: quiz.id,
            score,
            total_questions: total,
            correct_questions: correct,
            answers: rows,
        },
        wrong_items,
        needs_note,
    }
}
