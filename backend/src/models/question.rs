// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{MAX_NUM_OPTIONS, MAX_NUM_QUESTIONS, MIN_NUM_OPTIONS};

/// Question format as tagged by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    AssertionReason,
    TrueFalse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Unknown values fall back to medium, matching how stored rows were written.
    pub fn parse_lenient(value: &str) -> Self {
        match value {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// Language the generated questions are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub correct: bool,
    /// Only filled for the correct option by convention.
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    pub options: Vec<QuizOption>,
}

impl Question {
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.correct)
    }
}

/// One generated assessment. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Stable user id of the author; `None` for anonymous banks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_identity: Option<String>,
}

impl QuestionBank {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Checks the structural invariants every bank must hold before it can be played.
    ///
    /// * At least one question, each with non-empty text.
    /// * Exactly one correct option per question.
    /// * Multiple-choice questions carry at least `min_options` options,
    ///   true-false questions exactly two, assertion-reason at least two.
    pub fn validate(&self, min_options: usize) -> Result<(), MalformedBank> {
        if self.questions.is_empty() {
            return Err(MalformedBank::new(None, "bank contains no questions"));
        }

        for (index, question) in self.questions.iter().enumerate() {
            if question.text.trim().is_empty() {
                return Err(MalformedBank::new(Some(index), "question text is empty"));
            }

            if question.options.iter().any(|o| o.text.trim().is_empty()) {
                return Err(MalformedBank::new(Some(index), "option text is empty"));
            }

            let correct = question.options.iter().filter(|o| o.correct).count();
            if correct != 1 {
                return Err(MalformedBank::new(
                    Some(index),
                    format!("expected exactly one correct option, found {}", correct),
                ));
            }

            let count = question.options.len();
            match question.kind {
                QuestionKind::TrueFalse if count != 2 => {
                    return Err(MalformedBank::new(
                        Some(index),
                        format!("true-false question has {} options", count),
                    ));
                }
                QuestionKind::AssertionReason if count < 2 => {
                    return Err(MalformedBank::new(
                        Some(index),
                        format!("assertion-reason question has {} options", count),
                    ));
                }
                QuestionKind::MultipleChoice if count < min_options => {
                    return Err(MalformedBank::new(
                        Some(index),
                        format!("expected at least {} options, found {}", min_options, count),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// A bank that violates the question/option invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedBank {
    /// Zero-based index of the offending question, when one is to blame.
    pub question: Option<usize>,
    pub reason: String,
}

impl MalformedBank {
    pub fn new(question: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            question,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.question {
            Some(index) => write!(f, "question {}: {}", index + 1, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for MalformedBank {}

/// DTO for sending a question to players (hides correctness and explanations).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    pub options: Vec<String>,
}

impl PublicQuestion {
    pub fn from_bank(bank: &QuestionBank) -> Vec<PublicQuestion> {
        bank.questions
            .iter()
            .enumerate()
            .map(|(index, q)| PublicQuestion {
                index,
                kind: q.kind,
                question: q.text.clone(),
                options: q.options.iter().map(|o| o.text.clone()).collect(),
            })
            .collect()
    }
}

/// DTO for asking the AI provider for a new assessment.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    /// Topic, or text already extracted from a video or document.
    #[validate(length(min = 2, max = 20000))]
    pub prompt: String,
    #[validate(range(min = 1, max = MAX_NUM_QUESTIONS))]
    pub num_questions: Option<u32>,
    #[validate(range(min = MIN_NUM_OPTIONS, max = MAX_NUM_OPTIONS))]
    pub num_options: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub language: Language,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub topic: Option<String>,
}

/// DTO for storing a hand-written assessment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(length(max = 200))]
    pub topic: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub questions: Vec<Question>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::bank;
    use super::*;

    #[test]
    fn valid_bank_passes() {
        assert!(bank(3).validate(4).is_ok());
    }

    #[test]
    fn missing_correct_option_is_malformed() {
        let mut b = bank(3);
        for option in &mut b.questions[1].options {
            option.correct = false;
        }
        let err = b.validate(4).unwrap_err();
        assert_eq!(err.question, Some(1));
    }

    #[test]
    fn two_correct_options_is_malformed() {
        let mut b = bank(2);
        b.questions[0].options[3].correct = true;
        assert!(b.validate(4).is_err());
    }

    #[test]
    fn fewer_options_than_requested_is_malformed() {
        let b = bank(2);
        assert!(b.validate(5).is_err());
    }

    #[test]
    fn true_false_needs_exactly_two_options() {
        let mut b = bank(1);
        b.questions[0].kind = QuestionKind::TrueFalse;
        assert!(b.validate(4).is_err());

        b.questions[0].options.truncate(2);
        b.questions[0].options[0].correct = true;
        b.questions[0].options[1].correct = false;
        assert!(b.validate(4).is_ok());
    }

    #[test]
    fn empty_bank_is_malformed() {
        let mut b = bank(1);
        b.questions.clear();
        assert!(b.validate(2).is_err());
    }

    #[test]
    fn question_kind_uses_kebab_case_tags() {
        let q: Question = serde_json::from_str(
            r#"{"question":"Q","type":"assertion-reason","options":[]}"#,
        )
        .unwrap();
        assert_eq!(q.kind, QuestionKind::AssertionReason);

        let q: Question = serde_json::from_str(r#"{"question":"Q","options":[]}"#).unwrap();
        assert_eq!(q.kind, QuestionKind::MultipleChoice);
    }

    #[test]
    fn generation_request_limits_follow_config() {
        let request: GenerateQuizRequest = serde_json::from_value(serde_json::json!({
            "prompt": "Rust",
            "num_questions": MAX_NUM_QUESTIONS,
            "num_options": MAX_NUM_OPTIONS
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let request: GenerateQuizRequest = serde_json::from_value(serde_json::json!({
            "prompt": "Rust",
            "num_questions": MAX_NUM_QUESTIONS + 1,
            "num_options": MIN_NUM_OPTIONS - 1
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("num_questions"));
        assert!(fields.contains_key("num_options"));
    }
}
