// src/services/scorer.rs

use crate::models::{
    attempt::{AttemptError, AttemptState},
    question::QuestionBank,
    result::{QuestionResult, ResultSummary},
};

pub const NOT_ANSWERED: &str = "Not answered";

/// Scores a finalized attempt against its bank.
///
/// Pure: the same bank and selections always yield the same summary.
/// An unanswered question counts as incorrect.
pub fn score(bank: &QuestionBank, attempt: &AttemptState) -> Result<ResultSummary, AttemptError> {
    if !attempt.is_finalized() {
        return Err(AttemptError::NotSubmitted);
    }

    let per_question: Vec<QuestionResult> = bank
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = attempt
                .selection(index)
                .and_then(|o| question.options.get(o));
            let correct = question.correct_option();

            QuestionResult {
                question_number: index + 1,
                question_text: question.text.clone(),
                question_kind: question.kind,
                user_answer_text: selected
                    .map_or_else(|| NOT_ANSWERED.to_string(), |o| o.text.clone()),
                correct_answer_text: correct.map(|o| o.text.clone()).unwrap_or_default(),
                is_correct: selected.is_some_and(|o| o.correct),
                explanation: correct.map(|o| o.explanation.clone()).unwrap_or_default(),
            }
        })
        .collect();

    let score = per_question.iter().filter(|r| r.is_correct).count() as u32;

    Ok(ResultSummary {
        score,
        total: per_question.len() as u32,
        per_question,
    })
}
