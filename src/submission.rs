//! Submission Gate - Single Entry Point
//!
//! Every outgoing form passes through here: rate limit, then full
//! validation, then a sanitized payload wrapped in a `Submission`.
//! Nothing reaches an endpoint without being validated first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{AuthRules, LoginForm, LoginPayload, SignupForm, SignupPayload};
use crate::config::FormsConfig;
use crate::product::{ImageFile, ProductForm, ProductRules, SanitizedProduct, SpecificationInput};
use crate::rate_limit::RateLimiter;
use crate::report::{format_validation_errors, ErrorReport};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Too many attempts for {identifier}, please wait and try again")]
    RateLimited { identifier: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    Login,
    Register,
    AddProduct,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Login => "/auth/login",
            Endpoint::Register => "/auth/register",
            Endpoint::AddProduct => "/products/addProduct",
        }
    }
}

/// A validated, sanitized request ready to hand to the HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission<T> {
    pub id: Uuid,
    pub endpoint: Endpoint,
    pub prepared_at: DateTime<Utc>,
    pub payload: T,
}

impl<T: Serialize> Submission<T> {
    fn new(endpoint: Endpoint, payload: T) -> Self {
        let submission = Self {
            id: Uuid::new_v4(),
            endpoint,
            prepared_at: Utc::now(),
            payload,
        };
        tracing::info!(id = %submission.id, endpoint = endpoint.path(), "submission prepared");
        submission
    }

    pub fn path(&self) -> &'static str {
        self.endpoint.path()
    }

    /// The request body as JSON.
    pub fn body(&self) -> Result<String, SubmissionError> {
        Ok(serde_json::to_string(&self.payload)?)
    }
}

pub struct SubmissionGate {
    limiter: RateLimiter,
    auth: AuthRules,
    product: ProductRules,
}

impl SubmissionGate {
    pub fn new(config: &FormsConfig) -> Self {
        Self {
            limiter: RateLimiter::from_config(&config.rate_limit),
            auth: AuthRules::new(config),
            product: ProductRules::new(config),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Sign in. The sanitized email is the rate-limit identifier.
    pub fn prepare_login(
        &mut self,
        form: &LoginForm,
    ) -> Result<Submission<LoginPayload>, SubmissionError> {
        let clean = self.auth.sanitize_login(form);
        self.admit(&clean.email)?;

        let errors = self.auth.validate_login(form);
        reject_if_invalid(Endpoint::Login, &errors)?;

        Ok(Submission::new(Endpoint::Login, LoginPayload::from(clean)))
    }

    /// Sign up. The sanitized email is the rate-limit identifier.
    pub fn prepare_signup(
        &mut self,
        form: &SignupForm,
    ) -> Result<Submission<SignupPayload>, SubmissionError> {
        let clean = self.auth.sanitize_signup(form);
        self.admit(&clean.email)?;

        let errors = self.auth.validate_signup(form);
        reject_if_invalid(Endpoint::Register, &errors)?;

        Ok(Submission::new(Endpoint::Register, SignupPayload::from(clean)))
    }

    /// Admin product upload, limited per `identifier` (the admin's session or email).
    pub fn prepare_product<'a, S, I>(
        &mut self,
        identifier: &str,
        form: &ProductForm,
        specifications: S,
        images: I,
    ) -> Result<Submission<SanitizedProduct>, SubmissionError>
    where
        S: IntoIterator<Item = &'a SpecificationInput>,
        I: IntoIterator<Item = &'a ImageFile>,
    {
        self.admit(identifier)?;

        let validation = self.product.validate_product(form, specifications, images);
        reject_if_invalid(Endpoint::AddProduct, &validation.errors)?;

        Ok(Submission::new(Endpoint::AddProduct, validation.sanitized))
    }

    fn admit(&mut self, identifier: &str) -> Result<(), SubmissionError> {
        if self.limiter.check(identifier) {
            Ok(())
        } else {
            Err(SubmissionError::RateLimited {
                identifier: identifier.to_string(),
            })
        }
    }
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self::new(&FormsConfig::default())
    }
}

fn reject_if_invalid<R: ErrorReport>(endpoint: Endpoint, errors: &R) -> Result<(), SubmissionError> {
    if !errors.has_errors() {
        return Ok(());
    }
    let messages = format_validation_errors(errors);
    tracing::debug!(endpoint = endpoint.path(), count = messages.len(), "submission rejected");
    Err(SubmissionError::ValidationFailed(messages.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
        }
    }

    fn signup() -> SignupForm {
        SignupForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "Ada@Example.com".into(),
            contact: "+44 20 7946 0958".into(),
            country: "GB".into(),
            password: "P@ssw0rd1".into(),
            confirm_password: "P@ssw0rd1".into(),
        }
    }

    fn product() -> ProductForm {
        ProductForm {
            name: "EEG Headset Pro".into(),
            summary: "Sixteen channel research-grade EEG headset.".into(),
            description: "Dry electrodes, wireless streaming and eight hours of battery life.".into(),
            overview: "Built for labs that need fast setup and clean signal.".into(),
            tutorial_link: String::new(),
            price: "1299".into(),
            enabled: true,
        }
    }

    #[test]
    fn test_login_submission() {
        let mut gate = SubmissionGate::default();
        let submission = gate.prepare_login(&login(" Ada@Example.com ", "secret")).unwrap();
        assert_eq!(submission.path(), "/auth/login");
        assert_eq!(submission.payload.email, "ada@example.com");
        assert_eq!(
            submission.body().unwrap(),
            r#"{"email":"ada@example.com","password":"secret"}"#
        );
    }

    #[test]
    fn test_signup_drops_confirmation() {
        let mut gate = SubmissionGate::default();
        let submission = gate.prepare_signup(&signup()).unwrap();
        assert_eq!(submission.endpoint, Endpoint::Register);
        let body = submission.body().unwrap();
        assert!(body.contains(r#""firstName":"Ada""#));
        assert!(!body.contains("confirmPassword"));
    }

    #[test]
    fn test_invalid_form_is_rejected() {
        let mut gate = SubmissionGate::default();
        let err = gate.prepare_login(&login("nope", "")).unwrap_err();
        match err {
            SubmissionError::ValidationFailed(msg) => {
                assert_eq!(msg, "Please enter a valid email address; Password is required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_applies_per_identifier() {
        let config = FormsConfig {
            rate_limit: RateLimitConfig {
                max_attempts: 2,
                window_ms: 60_000,
            },
            ..FormsConfig::default()
        };
        let mut gate = SubmissionGate::new(&config);

        // Failed validation still spends an attempt
        assert!(gate.prepare_login(&login("ada@example.com", "")).is_err());
        assert!(gate.prepare_login(&login("ada@example.com", "secret")).is_ok());
        assert!(matches!(
            gate.prepare_login(&login("ADA@example.com", "secret")),
            Err(SubmissionError::RateLimited { ref identifier }) if identifier == "ada@example.com"
        ));

        assert!(gate.prepare_login(&login("bob@example.com", "secret")).is_ok());
    }

    #[test]
    fn test_product_submission() {
        let mut gate = SubmissionGate::default();
        let specs = vec![SpecificationInput {
            name: "Channels".into(),
            description: "Sixteen dry electrodes".into(),
        }];
        let images = vec![ImageFile::new("front.png", "image/png", vec![0; 16])];

        let submission = gate
            .prepare_product("admin", &product(), &specs, &images)
            .unwrap();
        assert_eq!(submission.path(), "/products/addProduct");
        assert_eq!(submission.payload.specifications.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_product_rejection_lists_collection_errors() {
        let mut gate = SubmissionGate::default();
        let images: Vec<_> = (0..11)
            .map(|i| ImageFile::new(format!("{i}.png"), "image/png", vec![0]))
            .collect();
        let specs: &[SpecificationInput] = &[];

        let err = gate
            .prepare_product("admin", &product(), specs, &images)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Cannot upload more than 10 files"
        );
    }
}
