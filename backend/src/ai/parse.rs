// src/ai/parse.rs

//! Turns free-form model output into a validated `QuestionBank`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::{
    ai::{GenerationError, GenerationRequest},
    models::question::{Question, QuestionBank},
    utils::html::clean_bank,
};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*```[a-zA-Z]*\s*$").expect("valid fence pattern"));

#[derive(Debug, Deserialize)]
struct RawBank {
    questions: Vec<Question>,
}

/// Slice from the first `{` to the last `}`, after dropping markdown fences.
pub fn extract_json_object(content: &str) -> Option<String> {
    let unfenced = CODE_FENCE.replace_all(content, "");
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    Some(unfenced[start..=end].to_string())
}

/// Parses the provider answer for `request` and checks the bank invariants.
pub fn parse_bank(content: &str, request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
    let json = extract_json_object(content)
        .ok_or_else(|| GenerationError::Unparseable("no JSON object in response".to_string()))?;

    let raw: RawBank =
        serde_json::from_str(&json).map_err(|e| GenerationError::Unparseable(e.to_string()))?;

    let bank = clean_bank(QuestionBank {
        questions: raw.questions,
        title: None,
        description: None,
        difficulty: request.difficulty,
        topic: None,
        creator_identity: None,
    });
    bank.validate(request.num_options as usize)?;

    if bank.len() != request.num_questions as usize {
        tracing::debug!(
            "Generator returned {} questions, {} were requested",
            bank.len(),
            request.num_questions
        );
    }

    Ok(bank)
}
