// src/ai/prompts.rs

use crate::{
    ai::GenerationRequest,
    models::{question::Language, result::ResultSummary},
};

pub const TUTOR_SYSTEM_PROMPT: &str = "You are an expert teacher. Your job is to provide helpful, \
accurate, and engaging responses to student questions. Keep your answers concise and easy to understand.";

/// How many questions of each kind to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMix {
    pub multiple_choice: u32,
    pub assertion_reason: u32,
    pub true_false: u32,
}

impl QuestionMix {
    /// Roughly 20% assertion-reason and 10% true-false, both rounded up,
    /// the remainder multiple choice.
    pub fn for_total(total: u32) -> Self {
        let assertion_reason = (total * 2).div_ceil(10);
        let true_false = total.div_ceil(10);
        let multiple_choice = total.saturating_sub(assertion_reason + true_false);
        Self {
            multiple_choice,
            assertion_reason,
            true_false,
        }
    }
}

pub fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::English => "",
        Language::Hindi => "Generate the quiz in Hindi language.",
        Language::Hinglish => "Generate the quiz in Hinglish (mix of Hindi and English).",
    }
}

const FORMAT_EXAMPLE: &str = r#"{
  "questions": [
    {
      "question": "Multiple choice question text?",
      "type": "multiple-choice",
      "options": [
        {"text": "First option", "correct": false, "explanation": ""},
        {"text": "Second option", "correct": true, "explanation": "Detailed explanation why this is correct"},
        {"text": "Third option", "correct": false, "explanation": ""},
        {"text": "Fourth option", "correct": false, "explanation": ""}
      ]
    },
    {
      "question": "Assertion: [Your assertion statement]. Reason: [Your reason statement].",
      "type": "assertion-reason",
      "options": [
        {"text": "Both assertion and reason are true, and the reason correctly explains the assertion", "correct": false, "explanation": ""},
        {"text": "Both assertion and reason are true, but the reason does not explain the assertion", "correct": true, "explanation": "Detailed explanation"},
        {"text": "The assertion is true, but the reason is false", "correct": false, "explanation": ""},
        {"text": "The assertion is false, but the reason is true", "correct": false, "explanation": ""}
      ]
    },
    {
      "question": "True/False statement goes here",
      "type": "true-false",
      "options": [
        {"text": "True", "correct": true, "explanation": "Detailed explanation why this is true"},
        {"text": "False", "correct": false, "explanation": ""}
      ]
    }
  ]
}"#;

/// Full instruction text sent to the generator.
pub fn quiz_prompt(request: &GenerationRequest) -> String {
    let mix = QuestionMix::for_total(request.num_questions);

    format!(
        "You are an expert AI Quiz Generator. Create a quiz based on the following topic or content: \"{prompt}\".\n\n\
The quiz should be {difficulty} difficulty level with {total} questions total, structured as follows:\n\n\
1. {mc} standard multiple-choice questions, each with {options} options\n\
2. {ar} assertion-reason questions (where you provide a statement and a reason, and the user must determine if both are true and if the reason correctly explains the assertion)\n\
3. {tf} true-false questions\n\n\
For all question types:\n\
- Only ONE option should be correct in multiple-choice questions\n\
- Provide clear explanations for why the correct answer is right\n\
- Make wrong answers plausible but clearly incorrect\n\n\
Format your response as a valid JSON object with this structure:\n{format}\n\n\
{language}\n\n\
The explanations should only be provided for correct answers. Make sure all JSON is properly formatted with no errors.",
        prompt = request.prompt,
        difficulty = request.difficulty.as_str(),
        total = request.num_questions,
        mc = mix.multiple_choice,
        options = request.num_options,
        ar = mix.assertion_reason,
        tf = mix.true_false,
        format = FORMAT_EXAMPLE,
        language = language_instruction(request.language),
    )
}

/// Tutor system prompt, optionally grounded in extra context.
pub fn tutor_system_prompt(context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.trim().is_empty() => format!(
            "{}\n\nUse the following material when it is relevant to the question:\n{}",
            TUTOR_SYSTEM_PROMPT, ctx
        ),
        _ => TUTOR_SYSTEM_PROMPT.to_string(),
    }
}

/// Describes a scored attempt so the tutor can discuss the missed questions.
pub fn result_context(summary: &ResultSummary) -> String {
    let mut out = format!(
        "The student scored {} out of {} ({}%) on a quiz.",
        summary.score,
        summary.total,
        summary.percentage()
    );
    for result in summary.per_question.iter().filter(|r| !r.is_correct) {
        out.push_str(&format!(
            "\nQuestion {}: {}\n  Student answered: {}\n  Correct answer: {}",
            result.question_number, result.question_text, result.user_answer_text, result.correct_answer_text
        ));
        if !result.explanation.is_empty() {
            out.push_str(&format!("\n  Explanation: {}", result.explanation));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;

    #[test]
    fn mix_rounds_special_kinds_up() {
        assert_eq!(
            QuestionMix::for_total(5),
            QuestionMix {
                multiple_choice: 3,
                assertion_reason: 1,
                true_false: 1
            }
        );
        assert_eq!(
            QuestionMix::for_total(10),
            QuestionMix {
                multiple_choice: 7,
                assertion_reason: 2,
                true_false: 1
            }
        );
        assert_eq!(QuestionMix::for_total(1).multiple_choice, 0);
    }

    #[test]
    fn prompt_mentions_request_parameters() {
        let mut request = GenerationRequest::new("photosynthesis");
        request.num_questions = 10;
        request.num_options = 5;
        request.difficulty = Difficulty::Hard;
        request.language = Language::Hinglish;

        let prompt = quiz_prompt(&request);
        assert!(prompt.contains("\"photosynthesis\""));
        assert!(prompt.contains("hard difficulty level with 10 questions"));
        assert!(prompt.contains("7 standard multiple-choice questions, each with 5 options"));
        assert!(prompt.contains("Hinglish"));
    }

    #[test]
    fn english_adds_no_language_instruction() {
        assert!(language_instruction(Language::English).is_empty());
    }

    #[test]
    fn result_context_lists_only_missed_questions() {
        use crate::models::{question::QuestionKind, result::QuestionResult};

        let line = |n: usize, correct: bool| QuestionResult {
            question_number: n,
            question_text: format!("Q{}", n),
            question_kind: QuestionKind::MultipleChoice,
            user_answer_text: "A".to_string(),
            correct_answer_text: "B".to_string(),
            is_correct: correct,
            explanation: String::new(),
        };
        let summary = ResultSummary {
            score: 1,
            total: 2,
            per_question: vec![line(1, true), line(2, false)],
        };

        let context = result_context(&summary);
        assert!(context.starts_with("The student scored 1 out of 2 (50%)"));
        assert!(context.contains("Question 2: Q2"));
        assert!(!context.contains("Question 1:"));
    }

    #[test]
    fn tutor_prompt_includes_context_only_when_given() {
        assert_eq!(tutor_system_prompt(None), TUTOR_SYSTEM_PROMPT);
        assert_eq!(tutor_system_prompt(Some("  ")), TUTOR_SYSTEM_PROMPT);
        assert!(tutor_system_prompt(Some("Q1 was wrong")).ends_with("Q1 was wrong"));
    }
}
