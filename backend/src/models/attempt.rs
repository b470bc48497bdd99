// src/models/attempt.rs

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::models::question::QuestionBank;

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Unanswered,
    InProgress,
    Complete,
    Submitted,
}

/// Result of a `submit` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This call finalized the attempt.
    Submitted,
    /// The attempt was already finalized; nothing changed.
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    QuestionOutOfRange { index: usize, total: usize },
    OptionOutOfRange { question: usize, index: usize, options: usize },
    IncompleteAttempt { answered: usize, total: usize },
    AttemptFinalized,
    NotSubmitted,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::QuestionOutOfRange { index, total } => {
                write!(f, "question index {} is out of range (0..{})", index, total)
            }
            AttemptError::OptionOutOfRange {
                question,
                index,
                options,
            } => write!(
                f,
                "option index {} is out of range for question {} (0..{})",
                index, question, options
            ),
            AttemptError::IncompleteAttempt { answered, total } => {
                write!(f, "answered {} of {} questions", answered, total)
            }
            AttemptError::AttemptFinalized => write!(f, "attempt has already been submitted"),
            AttemptError::NotSubmitted => write!(f, "attempt has not been submitted yet"),
        }
    }
}

impl std::error::Error for AttemptError {}

/// One pass through a bank: question index to selected option index.
///
/// Selections can be revised freely until `submit` succeeds; after that the
/// state is frozen and every mutation is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    option_counts: Vec<usize>,
    selections: BTreeMap<usize, usize>,
    finalized: bool,
}

impl AttemptState {
    pub fn new(bank: &QuestionBank) -> Self {
        Self {
            option_counts: bank.questions.iter().map(|q| q.options.len()).collect(),
            selections: BTreeMap::new(),
            finalized: false,
        }
    }

    pub fn total(&self) -> usize {
        self.option_counts.len()
    }

    pub fn answered(&self) -> usize {
        self.selections.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn selection(&self, question: usize) -> Option<usize> {
        self.selections.get(&question).copied()
    }

    pub fn selections(&self) -> &BTreeMap<usize, usize> {
        &self.selections
    }

    pub fn status(&self) -> AttemptStatus {
        if self.finalized {
            AttemptStatus::Submitted
        } else if self.selections.is_empty() {
            AttemptStatus::Unanswered
        } else if self.selections.len() < self.total() {
            AttemptStatus::InProgress
        } else {
            AttemptStatus::Complete
        }
    }

    /// Records (or overwrites) the answer to one question.
    pub fn select_option(
        &mut self,
        question: usize,
        option: usize,
    ) -> Result<AttemptStatus, AttemptError> {
        if self.finalized {
            return Err(AttemptError::AttemptFinalized);
        }

        let options = *self
            .option_counts
            .get(question)
            .ok_or(AttemptError::QuestionOutOfRange {
                index: question,
                total: self.total(),
            })?;

        if option >= options {
            return Err(AttemptError::OptionOutOfRange {
                question,
                index: option,
                options,
            });
        }

        self.selections.insert(question, option);
        Ok(self.status())
    }

    /// Freezes the attempt. Calling it again after success is a no-op.
    pub fn submit(&mut self) -> Result<SubmitOutcome, AttemptError> {
        if self.finalized {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        if self.selections.len() < self.total() {
            return Err(AttemptError::IncompleteAttempt {
                answered: self.selections.len(),
                total: self.total(),
            });
        }

        self.finalized = true;
        Ok(SubmitOutcome::Submitted)
    }

    /// Fresh, unanswered state for the same bank.
    pub fn reset(&self) -> AttemptState {
        AttemptState {
            option_counts: self.option_counts.clone(),
            selections: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Marks the attempt as submitted regardless of gaps. Only for exercising the scorer.
    #[cfg(test)]
    pub(crate) fn force_finalize(&mut self) {
        self.finalized = true;
    }
}
