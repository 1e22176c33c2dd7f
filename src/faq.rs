//! FAQ Entry Form

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::report::{FieldErrors, Violation, ViolationKind};
use crate::rules::{validate_field, FieldRule, MinWords};
use crate::sanitize::{sanitize_faq_answer, sanitize_faq_question};

static QUESTION_RULE: LazyLock<FieldRule> = LazyLock::new(|| {
    FieldRule::new("Question")
        .required()
        .length(10, 200)
        .too_long_message("Question must be less than 200 characters")
        .check(MinWords { min: 3, noun: "Question" })
});

static ANSWER_RULE: LazyLock<FieldRule> = LazyLock::new(|| {
    FieldRule::new("Answer")
        .required()
        .length(20, 1000)
        .too_long_message("Answer must be less than 1000 characters")
        .check(MinWords { min: 5, noun: "Answer" })
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqForm {
    #[serde(default, deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaqField {
    Question,
    Answer,
}

impl FaqField {
    pub const ALL: &'static [FaqField] = &[FaqField::Question, FaqField::Answer];
}

/// An FAQ already published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
}

// The rules themselves carry no sanitizer: questions and answers have their
// own cleaners, applied before the rule runs.

pub fn validate_faq_question(question: &str) -> Option<Violation> {
    validate_field(&QUESTION_RULE, &sanitize_faq_question(question)).into_first()
}

pub fn validate_faq_answer(answer: &str) -> Option<Violation> {
    validate_field(&ANSWER_RULE, &sanitize_faq_answer(answer)).into_first()
}

pub fn faq_field(form: &FaqForm, field: FaqField) -> Vec<Violation> {
    match field {
        FaqField::Question => {
            validate_field(&QUESTION_RULE, &sanitize_faq_question(&form.question)).violations
        }
        FaqField::Answer => {
            validate_field(&ANSWER_RULE, &sanitize_faq_answer(&form.answer)).violations
        }
    }
}

pub fn validate_faq(form: &FaqForm) -> FieldErrors<FaqField> {
    let mut errors = FieldErrors::new();
    for &field in FaqField::ALL {
        errors.set(field, faq_field(form, field));
    }
    errors
}

pub fn sanitize_faq(form: &FaqForm) -> FaqForm {
    FaqForm {
        question: sanitize_faq_question(&form.question),
        answer: sanitize_faq_answer(&form.answer),
    }
}

/// Reject a question that already exists, ignoring case and the entry
/// being edited (`current_id`).
pub fn check_faq_duplicate(
    question: &str,
    existing: &[FaqEntry],
    current_id: Option<&str>,
) -> Option<Violation> {
    let wanted = sanitize_faq_question(question).to_lowercase();
    let duplicate = existing.iter().any(|faq| {
        Some(faq.id.as_str()) != current_id
            && sanitize_faq_question(&faq.question).to_lowercase() == wanted
    });

    duplicate.then(|| {
        Violation::new(
            ViolationKind::Duplicate,
            "A FAQ with this question already exists",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, question: &str) -> FaqEntry {
        FaqEntry {
            id: id.to_string(),
            question: question.to_string(),
            answer: "Every device ships with a two year warranty.".to_string(),
        }
    }

    #[test]
    fn question_needs_three_words() {
        assert_eq!(
            validate_faq_question("Warranty coverage??????").unwrap().kind,
            ViolationKind::TooFewWords
        );
        assert!(validate_faq_question("How long is the warranty?").is_none());
        assert_eq!(
            validate_faq_question(&"why ".repeat(60)).unwrap().message,
            "Question must be less than 200 characters"
        );
        assert_eq!(validate_faq_question("<>").unwrap().kind, ViolationKind::Required);
    }

    #[test]
    fn answer_needs_length_and_words() {
        assert_eq!(validate_faq_answer("Too short").unwrap().kind, ViolationKind::TooShort);
        assert_eq!(
            validate_faq_answer("Supercalifragilisticexpialidocious").unwrap().kind,
            ViolationKind::TooFewWords
        );
        assert!(validate_faq_answer("Two years from the delivery date.").is_none());
        assert_eq!(
            validate_faq_answer(&"word ".repeat(250)).unwrap().message,
            "Answer must be less than 1000 characters"
        );
    }

    #[test]
    fn form_collects_both_fields() {
        let errors = validate_faq(&FaqForm::default());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn duplicate_is_case_insensitive() {
        let existing = vec![entry("1", "How long is the warranty?")];
        assert!(check_faq_duplicate("how LONG is the warranty???", &existing, None).is_some());
        assert!(check_faq_duplicate("Do you ship abroad?", &existing, None).is_none());
    }

    #[test]
    fn editing_an_entry_is_not_a_duplicate_of_itself() {
        let existing = vec![entry("1", "How long is the warranty?")];
        assert!(check_faq_duplicate("How long is the warranty?", &existing, Some("1")).is_none());
        assert!(check_faq_duplicate("How long is the warranty?", &existing, Some("2")).is_some());
    }
}
