//! SL Neurorobotics Forms Core - Validation and Sanitization
//!
//! # Ground Rules
//! 1. Sanitize Before Checking
//! 2. Validation Returns Violations, Never Errors
//! 3. Errors Show Only Where The User Has Been
//! 4. Collections Have Hard Caps
//! 5. Nothing Is Submitted Unvalidated

pub mod sanitize;
pub mod report;
pub mod rules;
pub mod lenient;
pub mod config;
pub mod auth;
pub mod faq;
pub mod product;
pub mod gallery;
pub mod form_state;
pub mod rate_limit;
pub mod submission;

pub use sanitize::{
    sanitize_email, sanitize_faq_answer, sanitize_faq_question, sanitize_input, sanitize_phone,
    sanitize_url,
};
pub use report::{
    field_error, format_validation_errors, has_errors, has_field_error, ErrorReport, FieldErrors,
    FieldOutcome, Violation, ViolationKind,
};
pub use rules::{validate_field, FieldCheck, FieldKind, FieldRule, Sanitizer};
pub use config::{ConfigError, FormsConfig, RateLimitConfig};
pub use auth::{
    password_strength, validate_confirm_password, validate_contact, validate_country,
    validate_email, validate_first_name, validate_last_name, validate_login,
    validate_login_password, validate_password, validate_signup, AuthRules, LoginField, LoginForm,
    SignupField, SignupForm,
};
pub use faq::{check_faq_duplicate, validate_faq, validate_faq_answer, validate_faq_question, FaqEntry, FaqForm};
pub use product::{
    validate_image_file, validate_product, validate_specification, ImageFile, ProductErrors,
    ProductForm, ProductRules, ProductValidation, SanitizedProduct, SpecificationInput,
};
pub use gallery::{ImageGallery, SpecificationList};
pub use form_state::{FormModel, FormState};
pub use rate_limit::RateLimiter;
pub use submission::{Endpoint, Submission, SubmissionError, SubmissionGate};

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
