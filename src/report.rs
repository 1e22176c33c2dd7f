//! Violation Reporting - Typed Error Maps
//!
//! Validators never fail. They return violations, and these types carry
//! them back to whatever renders the form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    Required,
    TooShort,
    TooLong,
    OutOfRange,
    InvalidNumber,
    PatternMismatch,
    NotAllowed,
    Mismatch,
    TooManyItems,
    FileTooLarge,
    FileTypeNotAllowed,
    TooFewWords,
    Duplicate,
}

/// A single human-readable rule violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn required(label: &str) -> Self {
        Self::new(ViolationKind::Required, format!("{label} is required"))
    }

    pub fn too_short(label: &str, min: usize) -> Self {
        Self::new(
            ViolationKind::TooShort,
            format!("{label} must be at least {min} characters long"),
        )
    }

    pub fn too_long(label: &str, max: usize) -> Self {
        Self::new(
            ViolationKind::TooLong,
            format!("{label} must not exceed {max} characters"),
        )
    }

    pub fn too_many_items(label: &str, max: usize) -> Self {
        Self::new(
            ViolationKind::TooManyItems,
            format!("{label} cannot exceed {max} items"),
        )
    }
}

/// Result of validating one field: every violation plus the cleaned value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub violations: Vec<Violation>,
    pub sanitized: String,
}

impl FieldOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violation a form shows next to the input.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    pub fn into_first(self) -> Option<Violation> {
        self.violations.into_iter().next()
    }
}

/// Per-form error map keyed by the form's field enum.
///
/// Only fields with at least one violation are stored, so an empty map
/// means the form is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors<F: Ord> {
    entries: BTreeMap<F, Vec<Violation>>,
}

impl<F: Ord + Copy> FieldErrors<F> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Record the violations for a field, replacing anything stored before.
    /// An empty list clears the field.
    pub fn set(&mut self, field: F, violations: Vec<Violation>) {
        if violations.is_empty() {
            self.entries.remove(&field);
        } else {
            self.entries.insert(field, violations);
        }
    }

    pub fn push(&mut self, field: F, violation: Violation) {
        self.entries.entry(field).or_default().push(violation);
    }

    pub fn clear(&mut self, field: F) {
        self.entries.remove(&field);
    }

    pub fn get(&self, field: F) -> &[Violation] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &[Violation])> {
        self.entries.iter().map(|(f, v)| (*f, v.as_slice()))
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.entries.keys().copied()
    }
}

impl<F: Ord + Copy> Default for FieldErrors<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that can report form errors in a flattened, ordered way.
pub trait ErrorReport {
    fn messages(&self) -> Vec<String>;

    fn has_errors(&self) -> bool {
        !self.messages().is_empty()
    }
}

impl<F: Ord + Copy> ErrorReport for FieldErrors<F> {
    fn messages(&self) -> Vec<String> {
        self.entries
            .values()
            .flatten()
            .map(|v| v.message.clone())
            .collect()
    }

    fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }
}

pub fn has_errors(report: &impl ErrorReport) -> bool {
    report.has_errors()
}

pub fn has_field_error<F: Ord + Copy>(errors: &FieldErrors<F>, field: F) -> bool {
    !errors.get(field).is_empty()
}

/// First message recorded for `field`, if any.
pub fn field_error<F: Ord + Copy>(errors: &FieldErrors<F>, field: F) -> Option<&str> {
    errors.get(field).first().map(|v| v.message.as_str())
}

/// Flatten every message, nested collection errors included, in field order.
pub fn format_validation_errors(report: &impl ErrorReport) -> Vec<String> {
    report.messages()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    enum Field {
        FirstName,
        Email,
    }

    #[test]
    fn empty_violation_list_clears_field() {
        let mut errors = FieldErrors::new();
        errors.set(Field::Email, vec![Violation::required("Email")]);
        assert!(has_field_error(&errors, Field::Email));

        errors.set(Field::Email, vec![]);
        assert!(!has_field_error(&errors, Field::Email));
        assert!(!has_errors(&errors));
    }

    #[test]
    fn field_error_returns_first_message() {
        let mut errors = FieldErrors::new();
        errors.push(Field::FirstName, Violation::too_short("First name", 2));
        errors.push(Field::FirstName, Violation::required("First name"));

        assert_eq!(
            field_error(&errors, Field::FirstName),
            Some("First name must be at least 2 characters long")
        );
        assert_eq!(field_error(&errors, Field::Email), None);
    }

    #[test]
    fn formatted_errors_follow_field_order() {
        let mut errors = FieldErrors::new();
        errors.push(Field::Email, Violation::required("Email"));
        errors.push(Field::FirstName, Violation::required("First name"));

        assert_eq!(
            format_validation_errors(&errors),
            vec!["First name is required", "Email is required"]
        );
    }

    #[test]
    fn serializes_as_camel_case_map() {
        let mut errors = FieldErrors::new();
        errors.push(Field::FirstName, Violation::required("First name"));

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["firstName"][0]["kind"], "required");
        assert_eq!(json["firstName"][0]["message"], "First name is required");
    }
}
