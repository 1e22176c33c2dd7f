//! Field Rules - Declarative Constraints
//!
//! A `FieldRule` says what a field must look like. `validate_field` is the
//! single dispatcher every form goes through: sanitize, then check the
//! cleaned value in a fixed order.
//!
//! Order: required (short-circuits) -> length -> extra checks -> pattern
//! -> numeric bounds.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::report::{FieldOutcome, Violation, ViolationKind};
use crate::sanitize::{sanitize_email, sanitize_input, sanitize_phone, sanitize_url};

/// How a raw value is cleaned before any check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sanitizer {
    /// Passed through untouched (passwords).
    #[default]
    None,
    Trim,
    Input { max_len: Option<usize> },
    Email,
    Phone,
    Url,
}

impl Sanitizer {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Sanitizer::None => raw.to_string(),
            Sanitizer::Trim => raw.trim().to_string(),
            Sanitizer::Input { max_len } => sanitize_input(raw, *max_len),
            Sanitizer::Email => sanitize_email(raw),
            Sanitizer::Phone => sanitize_phone(raw),
            Sanitizer::Url => sanitize_url(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Number,
}

/// A regex plus the message shown when it does not match.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    pub fn new(regex: &Regex, message: impl Into<String>) -> Self {
        Self {
            regex: regex.clone(),
            message: message.into(),
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    fn violation(&self) -> Violation {
        Violation::new(ViolationKind::PatternMismatch, self.message.clone())
    }
}

/// What a check gets to look at.
pub struct CheckInput<'a> {
    pub label: &'a str,
    pub raw: &'a str,
    pub sanitized: &'a str,
    /// The other half of a paired field (the password, for a confirmation).
    pub counterpart: Option<&'a str>,
}

/// Form-specific check beyond the declarative constraints.
pub trait FieldCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation>;
}

/// Declarative constraint for one field.
#[derive(Clone, Default)]
pub struct FieldRule {
    pub label: String,
    pub required: bool,
    pub required_message: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub too_long_message: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<Pattern>,
    pub sanitizer: Sanitizer,
    pub kind: FieldKind,
    pub checks: Vec<Arc<dyn FieldCheck>>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checks: Vec<_> = self.checks.iter().map(|c| c.name()).collect();
        f.debug_struct("FieldRule")
            .field("label", &self.label)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("too_long_message", &self.too_long_message)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern)
            .field("sanitizer", &self.sanitizer)
            .field("kind", &self.kind)
            .field("checks", &checks)
            .finish()
    }
}

impl FieldRule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_message = Some(message.into());
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn too_long_message(mut self, message: impl Into<String>) -> Self {
        self.too_long_message = Some(message.into());
        self
    }

    pub fn number(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.kind = FieldKind::Number;
        self.min = min;
        self.max = max;
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn check(mut self, check: impl FieldCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    fn required_violation(&self) -> Violation {
        match &self.required_message {
            Some(message) => Violation::new(ViolationKind::Required, message.clone()),
            None => Violation::required(&self.label),
        }
    }
}

/// Validate one raw value against its rule.
pub fn validate_field(rule: &FieldRule, raw: &str) -> FieldOutcome {
    validate_field_with(rule, raw, None)
}

/// Validate a value whose rule compares against a second field.
pub fn validate_field_with(rule: &FieldRule, raw: &str, counterpart: Option<&str>) -> FieldOutcome {
    let sanitized = rule.sanitizer.apply(raw);
    let mut violations = Vec::new();

    // Untouched values (passwords) are blank only when empty.
    let blank = match rule.sanitizer {
        Sanitizer::None => sanitized.is_empty(),
        _ => sanitized.trim().is_empty(),
    };
    if blank {
        if rule.required {
            violations.push(rule.required_violation());
        } else if let Some(pattern) = &rule.pattern {
            // The sanitizer threw away something the user did type.
            if !raw.trim().is_empty() {
                violations.push(pattern.violation());
            }
        }
        return FieldOutcome { violations, sanitized };
    }

    let length = sanitized.chars().count();
    if let Some(min) = rule.min_length {
        if length < min {
            violations.push(Violation::too_short(&rule.label, min));
        }
    }
    if let Some(max) = rule.max_length {
        if length > max {
            violations.push(match &rule.too_long_message {
                Some(message) => Violation::new(ViolationKind::TooLong, message.clone()),
                None => Violation::too_long(&rule.label, max),
            });
        }
    }

    let input = CheckInput {
        label: &rule.label,
        raw,
        sanitized: &sanitized,
        counterpart,
    };
    for check in &rule.checks {
        violations.extend(check.check(&input));
    }

    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(&sanitized) {
            violations.push(pattern.violation());
        }
    }

    if rule.kind == FieldKind::Number {
        violations.extend(check_number(rule, &sanitized));
    }

    FieldOutcome { violations, sanitized }
}

fn check_number(rule: &FieldRule, value: &str) -> Vec<Violation> {
    let parsed = match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => {
            return vec![Violation::new(
                ViolationKind::InvalidNumber,
                format!("{} must be a valid number", rule.label),
            )]
        }
    };

    let mut violations = vec![];
    if let Some(min) = rule.min {
        if parsed < min {
            violations.push(Violation::new(
                ViolationKind::OutOfRange,
                format!("{} must be at least {}", rule.label, min),
            ));
        }
    }
    if let Some(max) = rule.max {
        if parsed > max {
            violations.push(Violation::new(
                ViolationKind::OutOfRange,
                format!("{} must not exceed {}", rule.label, max),
            ));
        }
    }
    violations
}

// --- Concrete Checks ---

/// Rejects raw input containing ASCII letters, before the sanitizer hides them.
pub struct NoLetters;

impl FieldCheck for NoLetters {
    fn name(&self) -> &'static str { "no_letters" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        if input.raw.chars().any(|c| c.is_ascii_alphabetic()) {
            vec![Violation::new(
                ViolationKind::PatternMismatch,
                format!("{} cannot contain letters", input.label),
            )]
        } else {
            vec![]
        }
    }
}

/// Bounds the number of ASCII digits in the cleaned value.
pub struct DigitCount {
    pub min: usize,
    pub max: usize,
}

impl FieldCheck for DigitCount {
    fn name(&self) -> &'static str { "digit_count" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let digits = input.sanitized.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < self.min {
            vec![Violation::new(
                ViolationKind::TooShort,
                format!("{} must contain at least {} digits", input.label, self.min),
            )]
        } else if digits > self.max {
            vec![Violation::new(
                ViolationKind::TooLong,
                format!("{} must contain at most {} digits", input.label, self.max),
            )]
        } else {
            vec![]
        }
    }
}

/// Value must be one of a closed list.
pub struct AllowList {
    pub values: &'static [&'static str],
    pub message: &'static str,
}

impl FieldCheck for AllowList {
    fn name(&self) -> &'static str { "allow_list" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        if self.values.iter().any(|v| *v == input.sanitized) {
            vec![]
        } else {
            vec![Violation::new(ViolationKind::NotAllowed, self.message)]
        }
    }
}

/// Password complexity: one of each character class.
pub struct CharClasses;

pub const PASSWORD_SPECIALS: &[char] = &['@', '$', '!', '%', '*', '?', '&'];

impl FieldCheck for CharClasses {
    fn name(&self) -> &'static str { "char_classes" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let value = input.sanitized;
        let classes: [(bool, &str); 4] = [
            (value.chars().any(|c| c.is_ascii_lowercase()), "one lowercase letter"),
            (value.chars().any(|c| c.is_ascii_uppercase()), "one uppercase letter"),
            (value.chars().any(|c| c.is_ascii_digit()), "one number"),
            (
                value.chars().any(|c| PASSWORD_SPECIALS.contains(&c)),
                "one special character (@$!%*?&)",
            ),
        ];

        classes
            .iter()
            .filter(|(present, _)| !present)
            .map(|(_, what)| {
                Violation::new(
                    ViolationKind::PatternMismatch,
                    format!("{} must contain at least {}", input.label, what),
                )
            })
            .collect()
    }
}

/// Value must equal its counterpart exactly.
pub struct MatchesCounterpart {
    pub message: &'static str,
}

impl FieldCheck for MatchesCounterpart {
    fn name(&self) -> &'static str { "matches_counterpart" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        if input.counterpart == Some(input.sanitized) {
            vec![]
        } else {
            vec![Violation::new(ViolationKind::Mismatch, self.message)]
        }
    }
}

/// Minimum number of whitespace-separated words.
pub struct MinWords {
    pub min: usize,
    pub noun: &'static str,
}

impl FieldCheck for MinWords {
    fn name(&self) -> &'static str { "min_words" }

    fn check(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        if input.sanitized.split_whitespace().count() < self.min {
            vec![Violation::new(
                ViolationKind::TooFewWords,
                format!("{} should contain at least {} words", self.noun, self.min),
            )]
        } else {
            vec![]
        }
    }
}
