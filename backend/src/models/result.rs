// src/models/result.rs

use serde::{Deserialize, Serialize};

use crate::models::question::QuestionKind;

/// Per-question line of a scored attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    /// 1-based.
    pub question_number: usize,
    pub question_text: String,
    pub question_kind: QuestionKind,
    pub user_answer_text: String,
    pub correct_answer_text: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// Outcome of scoring one finalized attempt. Derived, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub score: u32,
    pub total: u32,
    pub per_question: Vec<QuestionResult>,
}

impl ResultSummary {
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total)
    }

    pub fn tier(&self) -> ScoreTier {
        ScoreTier::for_score(self.score, self.total)
    }
}

/// `round(score / total * 100)` with halves rounded up. Zero when `total` is zero.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    ((200 * score + total) / (2 * total)) as u32
}

/// Feedback band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Perfect,
    Great,
    GoodEffort,
    NiceTry,
    KeepPracticing,
}

impl ScoreTier {
    /// Bands are evaluated on the exact ratio, so only a full score is perfect.
    pub fn for_score(score: u32, total: u32) -> Self {
        if total == 0 {
            return ScoreTier::KeepPracticing;
        }
        let (score, total) = (u64::from(score), u64::from(total));
        let scaled = score * 100;
        if score >= total {
            ScoreTier::Perfect
        } else if scaled >= 80 * total {
            ScoreTier::Great
        } else if scaled >= 60 * total {
            ScoreTier::GoodEffort
        } else if scaled >= 40 * total {
            ScoreTier::NiceTry
        } else {
            ScoreTier::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreTier::Perfect => "Perfect score! Excellent work!",
            ScoreTier::Great => "Great job! You've mastered this topic!",
            ScoreTier::GoodEffort => "Good effort! Keep learning!",
            ScoreTier::NiceTry => "Nice try! Review the explanations to improve!",
            ScoreTier::KeepPracticing => "Keep practicing! Review the material and try again!",
        }
    }
}
