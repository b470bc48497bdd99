// src/utils/html.rs

use crate::models::question::QuestionBank;

/// Whitelist-based sanitization: safe formatting tags survive, `<script>`
/// (with its content), event handler attributes and the like are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

fn clean_optional(field: &mut Option<String>) {
    if let Some(value) = field {
        *value = clean_html(value);
    }
}

/// Sanitizes every free-text field of a bank. Generated and hand-written
/// banks both pass through here before they are stored.
pub fn clean_bank(mut bank: QuestionBank) -> QuestionBank {
    for question in &mut bank.questions {
        question.text = clean_html(&question.text);
        for option in &mut question.options {
            option.text = clean_html(&option.text);
            option.explanation = clean_html(&option.explanation);
        }
    }
    clean_optional(&mut bank.title);
    clean_optional(&mut bank.description);
    clean_optional(&mut bank.topic);
    bank
}
