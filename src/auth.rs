//! Sign-up and Sign-in Forms
//!
//! Both forms share one set of field rules. Sign-in only reuses the email
//! rule and a presence-only password rule, so a password set before the
//! complexity policy existed still logs in.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::FormsConfig;
use crate::lenient;
use crate::report::{FieldErrors, Violation};
use crate::rules::{
    validate_field, validate_field_with, AllowList, CharClasses, DigitCount, FieldRule,
    MatchesCounterpart, NoLetters, Pattern, Sanitizer,
};
use crate::sanitize::{sanitize_email, sanitize_input, sanitize_phone};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[0-9\s\-()]{7,20}$").expect("valid regex"));

static DEFAULT_RULES: LazyLock<AuthRules> =
    LazyLock::new(|| AuthRules::new(&FormsConfig::default()));

pub const EMAIL_MAX_LENGTH: usize = 254;

/// Country codes offered by the registration form.
pub const COUNTRY_CODES: &[&str] = &[
    "US", "CA", "GB", "AU", "DE", "FR", "JP", "IN", "BR", "MX", "IT", "ES", "NL", "SE", "NO",
    "DK", "FI", "CH", "AT", "BE", "LK", "SG", "MY", "TH", "PH", "ID", "VN", "KR", "CN", "HK",
    "TW", "NZ", "ZA", "NG", "EG", "MA", "KE", "GH", "AE", "SA", "IL", "TR", "RU", "PL", "CZ",
    "HU", "RO", "BG", "HR", "SK", "SI", "LT", "LV", "EE", "AR", "CL", "CO", "PE", "VE", "UY",
    "PY", "BO", "EC", "GT", "HN", "SV", "NI", "CR", "PA", "DO", "CU", "JM", "TT", "BB", "BS",
    "BZ", "GY", "SR", "UZ", "KZ", "KG", "TJ", "TM", "AF", "PK", "BD", "NP", "BT", "MV", "MM",
    "LA", "KH", "BN", "TL", "PG", "FJ", "VU", "SB", "NC", "PF", "WS", "TO", "KI", "TV", "NR",
    "PW", "FM", "MH",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub contact: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignupField {
    FirstName,
    LastName,
    Email,
    Contact,
    Country,
    Password,
    ConfirmPassword,
}

impl SignupField {
    pub const ALL: &'static [SignupField] = &[
        SignupField::FirstName,
        SignupField::LastName,
        SignupField::Email,
        SignupField::Contact,
        SignupField::Country,
        SignupField::Password,
        SignupField::ConfirmPassword,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoginField {
    Email,
    Password,
}

impl LoginField {
    pub const ALL: &'static [LoginField] = &[LoginField::Email, LoginField::Password];
}

/// Body posted to `/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact: String,
    pub country: String,
    pub password: String,
}

/// Body posted to `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Field rules for the auth forms under one config.
#[derive(Debug, Clone)]
pub struct AuthRules {
    pub first_name: FieldRule,
    pub last_name: FieldRule,
    pub email: FieldRule,
    pub contact: FieldRule,
    pub country: FieldRule,
    pub password: FieldRule,
    pub login_password: FieldRule,
    pub confirm_password: FieldRule,
    input_limit: Option<usize>,
}

fn name_rule(label: &str, limit: Option<usize>) -> FieldRule {
    FieldRule::new(label)
        .required()
        .sanitizer(Sanitizer::Input { max_len: limit })
        .length(2, 50)
        .too_long_message(format!("{label} must be less than 50 characters"))
        .pattern(Pattern::new(
            &NAME_RE,
            format!("{label} can only contain letters, spaces, hyphens, and apostrophes"),
        ))
}

impl AuthRules {
    pub fn new(config: &FormsConfig) -> Self {
        let limit = config.auth_input_limit;
        Self {
            first_name: name_rule("First name", limit),
            last_name: name_rule("Last name", limit),
            email: FieldRule::new("Email address")
                .required()
                .sanitizer(Sanitizer::Email)
                .max_length(EMAIL_MAX_LENGTH)
                .pattern(Pattern::new(&EMAIL_RE, "Please enter a valid email address")),
            contact: FieldRule::new("Phone number")
                .required()
                .sanitizer(Sanitizer::Phone)
                .check(NoLetters)
                .check(DigitCount { min: 8, max: 14 })
                .pattern(Pattern::new(&PHONE_RE, "Please enter a valid phone number")),
            country: FieldRule::new("Country")
                .required_message("Please select a country")
                .check(AllowList {
                    values: COUNTRY_CODES,
                    message: "Please select a valid country",
                }),
            password: FieldRule::new("Password")
                .required()
                .length(8, 128)
                .too_long_message("Password must be less than 128 characters")
                .check(CharClasses),
            login_password: FieldRule::new("Password").required(),
            confirm_password: FieldRule::new("Confirm password")
                .required_message("Please confirm your password")
                .check(MatchesCounterpart {
                    message: "Passwords do not match",
                }),
            input_limit: limit,
        }
    }

    pub fn signup_field(&self, form: &SignupForm, field: SignupField) -> Vec<Violation> {
        let outcome = match field {
            SignupField::FirstName => validate_field(&self.first_name, &form.first_name),
            SignupField::LastName => validate_field(&self.last_name, &form.last_name),
            SignupField::Email => validate_field(&self.email, &form.email),
            SignupField::Contact => validate_field(&self.contact, &form.contact),
            SignupField::Country => validate_field(&self.country, &form.country),
            SignupField::Password => validate_field(&self.password, &form.password),
            SignupField::ConfirmPassword => validate_field_with(
                &self.confirm_password,
                &form.confirm_password,
                Some(&form.password),
            ),
        };
        outcome.violations
    }

    pub fn login_field(&self, form: &LoginForm, field: LoginField) -> Vec<Violation> {
        match field {
            LoginField::Email => validate_field(&self.email, &form.email).violations,
            LoginField::Password => validate_field(&self.login_password, &form.password).violations,
        }
    }

    pub fn validate_signup(&self, form: &SignupForm) -> FieldErrors<SignupField> {
        let mut errors = FieldErrors::new();
        for &field in SignupField::ALL {
            errors.set(field, self.signup_field(form, field));
        }
        errors
    }

    pub fn validate_login(&self, form: &LoginForm) -> FieldErrors<LoginField> {
        let mut errors = FieldErrors::new();
        for &field in LoginField::ALL {
            errors.set(field, self.login_field(form, field));
        }
        errors
    }

    /// Clean a sign-up form field by field. Passwords pass through untouched.
    pub fn sanitize_signup(&self, form: &SignupForm) -> SignupForm {
        SignupForm {
            first_name: sanitize_input(&form.first_name, self.input_limit),
            last_name: sanitize_input(&form.last_name, self.input_limit),
            email: sanitize_email(&form.email),
            contact: sanitize_phone(&form.contact),
            country: form.country.clone(),
            password: form.password.clone(),
            confirm_password: form.confirm_password.clone(),
        }
    }

    pub fn sanitize_login(&self, form: &LoginForm) -> LoginForm {
        LoginForm {
            email: sanitize_email(&form.email),
            password: form.password.clone(),
        }
    }
}

impl Default for AuthRules {
    fn default() -> Self {
        Self::new(&FormsConfig::default())
    }
}

impl From<SignupForm> for SignupPayload {
    fn from(form: SignupForm) -> Self {
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            contact: form.contact,
            country: form.country,
            password: form.password,
        }
    }
}

impl From<LoginForm> for LoginPayload {
    fn from(form: LoginForm) -> Self {
        Self {
            email: form.email,
            password: form.password,
        }
    }
}

// --- Per-field validators with default limits ---

pub fn validate_first_name(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.first_name, value).into_first()
}

pub fn validate_last_name(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.last_name, value).into_first()
}

pub fn validate_email(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.email, value).into_first()
}

pub fn validate_contact(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.contact, value).into_first()
}

pub fn validate_country(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.country, value).into_first()
}

/// Sign-up password policy.
pub fn validate_password(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.password, value).into_first()
}

/// Sign-in password: presence only.
pub fn validate_login_password(value: &str) -> Option<Violation> {
    validate_field(&DEFAULT_RULES.login_password, value).into_first()
}

pub fn validate_confirm_password(password: &str, confirm_password: &str) -> Option<Violation> {
    validate_field_with(&DEFAULT_RULES.confirm_password, confirm_password, Some(password))
        .into_first()
}

pub fn validate_signup(form: &SignupForm) -> FieldErrors<SignupField> {
    DEFAULT_RULES.validate_signup(form)
}

pub fn validate_login(form: &LoginForm) -> FieldErrors<LoginField> {
    DEFAULT_RULES.validate_login(form)
}

// --- Password strength meter ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrengthLabel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    /// 0..=5, one point per satisfied criterion.
    pub score: u8,
    pub label: StrengthLabel,
}

/// Score shown under the new-password field while the user types.
pub fn password_strength(password: &str) -> PasswordStrength {
    let criteria = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = criteria.iter().filter(|met| **met).count() as u8;

    let label = match score {
        0 | 1 => StrengthLabel::VeryWeak,
        2 => StrengthLabel::Weak,
        3 => StrengthLabel::Fair,
        4 => StrengthLabel::Good,
        _ => StrengthLabel::Strong,
    };

    PasswordStrength { score, label }
}
