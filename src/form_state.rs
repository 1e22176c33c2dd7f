//! Form State - Lazy Validation
//!
//! Errors are computed as the user types but only shown for fields the user
//! has left at least once. A submit attempt marks every field touched.

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::auth::{AuthRules, LoginField, LoginForm, SignupField, SignupForm};
use crate::faq::{faq_field, sanitize_faq, FaqField, FaqForm};
use crate::product::{ProductField, ProductForm, ProductRules};
use crate::report::{field_error, FieldErrors, Violation};

/// A typed form the state machine can drive.
pub trait FormModel: Clone + Default {
    type Field: Copy + Ord + Debug + 'static;
    type Rules;

    fn fields() -> &'static [Self::Field];
    fn value(&self, field: Self::Field) -> &str;
    fn set_value(&mut self, field: Self::Field, value: String);
    fn check(rules: &Self::Rules, form: &Self, field: Self::Field) -> Vec<Violation>;
    fn sanitize(rules: &Self::Rules, form: &Self) -> Self;

    /// Fields whose result depends on `field` and must be rechecked when it changes.
    fn dependents(_field: Self::Field) -> &'static [Self::Field] {
        &[]
    }
}

pub struct FormState<M: FormModel> {
    rules: M::Rules,
    model: M,
    touched: BTreeSet<M::Field>,
    errors: FieldErrors<M::Field>,
}

impl<M: FormModel> FormState<M> {
    pub fn new(rules: M::Rules) -> Self {
        Self {
            rules,
            model: M::default(),
            touched: BTreeSet::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn errors(&self) -> &FieldErrors<M::Field> {
        &self.errors
    }

    pub fn is_touched(&self, field: M::Field) -> bool {
        self.touched.contains(&field)
    }

    /// Keystroke. Revalidates the field, and anything that depends on it,
    /// only where the user has already been.
    pub fn set_value(&mut self, field: M::Field, value: impl Into<String>) {
        self.model.set_value(field, value.into());
        if self.is_touched(field) {
            self.revalidate(field);
        }
        for &dependent in M::dependents(field) {
            if self.is_touched(dependent) {
                self.revalidate(dependent);
            }
        }
    }

    /// Focus left the field.
    pub fn blur(&mut self, field: M::Field) {
        self.touched.insert(field);
        self.revalidate(field);
    }

    /// The message to render under the input, if any.
    pub fn visible_error(&self, field: M::Field) -> Option<&str> {
        if self.is_touched(field) {
            field_error(&self.errors, field)
        } else {
            None
        }
    }

    /// Touch and validate everything. On success, returns the sanitized form.
    pub fn submit(&mut self) -> Result<M, FieldErrors<M::Field>> {
        for &field in M::fields() {
            self.touched.insert(field);
            self.revalidate(field);
        }

        if self.errors.is_empty() {
            Ok(M::sanitize(&self.rules, &self.model))
        } else {
            tracing::debug!(fields = ?self.errors.fields().collect::<Vec<_>>(), "form submit blocked");
            Err(self.errors.clone())
        }
    }

    /// Back to a blank, untouched form.
    pub fn reset(&mut self) {
        self.model = M::default();
        self.touched.clear();
        self.errors = FieldErrors::new();
    }

    fn revalidate(&mut self, field: M::Field) {
        let violations = M::check(&self.rules, &self.model, field);
        self.errors.set(field, violations);
    }
}

impl<M: FormModel> Default for FormState<M>
where
    M::Rules: Default,
{
    fn default() -> Self {
        Self::new(M::Rules::default())
    }
}

impl FormModel for SignupForm {
    type Field = SignupField;
    type Rules = AuthRules;

    fn fields() -> &'static [SignupField] {
        SignupField::ALL
    }

    fn value(&self, field: SignupField) -> &str {
        match field {
            SignupField::FirstName => &self.first_name,
            SignupField::LastName => &self.last_name,
            SignupField::Email => &self.email,
            SignupField::Contact => &self.contact,
            SignupField::Country => &self.country,
            SignupField::Password => &self.password,
            SignupField::ConfirmPassword => &self.confirm_password,
        }
    }

    fn set_value(&mut self, field: SignupField, value: String) {
        match field {
            SignupField::FirstName => self.first_name = value,
            SignupField::LastName => self.last_name = value,
            SignupField::Email => self.email = value,
            SignupField::Contact => self.contact = value,
            SignupField::Country => self.country = value,
            SignupField::Password => self.password = value,
            SignupField::ConfirmPassword => self.confirm_password = value,
        }
    }

    fn check(rules: &AuthRules, form: &Self, field: SignupField) -> Vec<Violation> {
        rules.signup_field(form, field)
    }

    fn sanitize(rules: &AuthRules, form: &Self) -> Self {
        rules.sanitize_signup(form)
    }

    fn dependents(field: SignupField) -> &'static [SignupField] {
        match field {
            SignupField::Password => &[SignupField::ConfirmPassword],
            _ => &[],
        }
    }
}

impl FormModel for LoginForm {
    type Field = LoginField;
    type Rules = AuthRules;

    fn fields() -> &'static [LoginField] {
        LoginField::ALL
    }

    fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
        }
    }

    fn set_value(&mut self, field: LoginField, value: String) {
        match field {
            LoginField::Email => self.email = value,
            LoginField::Password => self.password = value,
        }
    }

    fn check(rules: &AuthRules, form: &Self, field: LoginField) -> Vec<Violation> {
        rules.login_field(form, field)
    }

    fn sanitize(rules: &AuthRules, form: &Self) -> Self {
        rules.sanitize_login(form)
    }
}

impl FormModel for FaqForm {
    type Field = FaqField;
    type Rules = ();

    fn fields() -> &'static [FaqField] {
        FaqField::ALL
    }

    fn value(&self, field: FaqField) -> &str {
        match field {
            FaqField::Question => &self.question,
            FaqField::Answer => &self.answer,
        }
    }

    fn set_value(&mut self, field: FaqField, value: String) {
        match field {
            FaqField::Question => self.question = value,
            FaqField::Answer => self.answer = value,
        }
    }

    fn check(_rules: &(), form: &Self, field: FaqField) -> Vec<Violation> {
        faq_field(form, field)
    }

    fn sanitize(_rules: &(), form: &Self) -> Self {
        sanitize_faq(form)
    }
}

impl FormModel for ProductForm {
    type Field = ProductField;
    type Rules = ProductRules;

    fn fields() -> &'static [ProductField] {
        ProductField::ALL
    }

    fn value(&self, field: ProductField) -> &str {
        match field {
            ProductField::Name => &self.name,
            ProductField::Summary => &self.summary,
            ProductField::Description => &self.description,
            ProductField::Overview => &self.overview,
            ProductField::Price => &self.price,
            ProductField::TutorialLink => &self.tutorial_link,
        }
    }

    fn set_value(&mut self, field: ProductField, value: String) {
        match field {
            ProductField::Name => self.name = value,
            ProductField::Summary => self.summary = value,
            ProductField::Description => self.description = value,
            ProductField::Overview => self.overview = value,
            ProductField::Price => self.price = value,
            ProductField::TutorialLink => self.tutorial_link = value,
        }
    }

    fn check(rules: &ProductRules, form: &Self, field: ProductField) -> Vec<Violation> {
        rules.product_field(form, field)
    }

    fn sanitize(rules: &ProductRules, form: &Self) -> Self {
        rules.sanitize_form(form)
    }
}
