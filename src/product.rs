//! Admin Product Form
//!
//! Text fields, price, optional tutorial link, plus two bounded collections:
//! specifications (max 20) and images (max 10). Whole-form validation never
//! stops at the first problem; it reports everything it can.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::FormsConfig;
use crate::lenient;
use crate::report::{ErrorReport, FieldErrors, Violation, ViolationKind};
use crate::rules::{validate_field, FieldRule, Pattern, Sanitizer};
use crate::sanitize::URL_MAX_LENGTH;

static TUTORIAL_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+\..+").expect("valid regex"));

static DEFAULT_RULES: LazyLock<ProductRules> =
    LazyLock::new(|| ProductRules::new(&FormsConfig::default()));

pub const MAX_SPECIFICATIONS: usize = 20;
pub const MAX_IMAGES: usize = 10;
pub const MAX_IMAGE_BYTES: u64 = 8 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Executable-looking extensions refused whatever the declared MIME type.
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "scr", "pif", "com", "js", "jar", "php", "asp", "jsp",
];

fn default_true() -> bool { true }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tutorial_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: String,
    #[serde(default = "default_true", deserialize_with = "lenient::flag")]
    pub enabled: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            summary: String::new(),
            description: String::new(),
            overview: String::new(),
            tutorial_link: String::new(),
            price: String::new(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductField {
    Name,
    Summary,
    Description,
    Overview,
    Price,
    TutorialLink,
}

impl ProductField {
    pub const ALL: &'static [ProductField] = &[
        ProductField::Name,
        ProductField::Summary,
        ProductField::Description,
        ProductField::Overview,
        ProductField::Price,
        ProductField::TutorialLink,
    ];
}

/// A name/description pair as typed into the specification inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationInput {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecField {
    Name,
    Description,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecificationCheck {
    pub errors: FieldErrors<SpecField>,
    pub sanitized: SpecificationInput,
}

impl SpecificationCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// File metadata from the picker. Contents are only ever used to build
/// a preview, never inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, alias = "type", deserialize_with = "lenient::string")]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing)]
    pub contents: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: contents.len() as u64,
            contents,
        }
    }
}

/// Errors for a bounded collection: either it is too big as a whole, or
/// individual items (by index) are bad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionErrors<T> {
    TooMany(Violation),
    Items(BTreeMap<usize, T>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductErrors {
    pub fields: FieldErrors<ProductField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<CollectionErrors<FieldErrors<SpecField>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<CollectionErrors<Vec<Violation>>>,
}

impl ProductErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.specifications.is_none() && self.images.is_none()
    }
}

impl ErrorReport for ProductErrors {
    fn messages(&self) -> Vec<String> {
        let mut out = self.fields.messages();
        match &self.specifications {
            Some(CollectionErrors::TooMany(v)) => out.push(v.message.clone()),
            Some(CollectionErrors::Items(items)) => {
                out.extend(items.values().flat_map(|e| e.messages()));
            }
            None => {}
        }
        match &self.images {
            Some(CollectionErrors::TooMany(v)) => out.push(v.message.clone()),
            Some(CollectionErrors::Items(items)) => {
                out.extend(items.values().flatten().map(|v| v.message.clone()));
            }
            None => {}
        }
        out
    }

    fn has_errors(&self) -> bool {
        !self.is_empty()
    }
}

/// Body posted (as the `product` part) to `/products/addProduct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedProduct {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub overview: String,
    pub tutorial_link: String,
    pub price: String,
    pub enabled: bool,
    /// Absent when the collection was over the cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<SpecificationInput>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductValidation {
    pub is_valid: bool,
    pub errors: ProductErrors,
    pub sanitized: SanitizedProduct,
}

/// Field rules for the admin forms under one config.
#[derive(Debug, Clone)]
pub struct ProductRules {
    pub name: FieldRule,
    pub summary: FieldRule,
    pub description: FieldRule,
    pub overview: FieldRule,
    pub price: FieldRule,
    pub tutorial_link: FieldRule,
    pub spec_name: FieldRule,
    pub spec_description: FieldRule,
}

impl ProductRules {
    pub fn new(config: &FormsConfig) -> Self {
        let text = |label: &str, min: usize, max: usize| {
            FieldRule::new(label)
                .required()
                .sanitizer(Sanitizer::Input {
                    max_len: Some(config.admin_input_limit),
                })
                .length(min, max)
        };

        Self {
            name: text("Name", 5, 100),
            summary: text("Summary", 10, 800),
            description: text("Description", 20, 2000),
            overview: text("Overview", 20, 1000),
            price: FieldRule::new("Price")
                .required()
                .sanitizer(Sanitizer::Trim)
                .number(Some(0.0), None),
            tutorial_link: FieldRule::new("Tutorial Link")
                .sanitizer(Sanitizer::Url)
                .max_length(URL_MAX_LENGTH)
                .pattern(Pattern::new(
                    &TUTORIAL_LINK_RE,
                    "Tutorial Link must be a valid URL (starting with http:// or https://)",
                )),
            spec_name: text("Specification name", 2, 100),
            spec_description: text("Specification description", 5, 500),
        }
    }

    fn rule(&self, field: ProductField) -> &FieldRule {
        match field {
            ProductField::Name => &self.name,
            ProductField::Summary => &self.summary,
            ProductField::Description => &self.description,
            ProductField::Overview => &self.overview,
            ProductField::Price => &self.price,
            ProductField::TutorialLink => &self.tutorial_link,
        }
    }

    pub fn product_field(&self, form: &ProductForm, field: ProductField) -> Vec<Violation> {
        validate_field(self.rule(field), field_value(form, field)).violations
    }

    /// Apply each field's sanitizer without validating.
    pub fn sanitize_form(&self, form: &ProductForm) -> ProductForm {
        let clean = |field| self.rule(field).sanitizer.apply(field_value(form, field));
        ProductForm {
            name: clean(ProductField::Name),
            summary: clean(ProductField::Summary),
            description: clean(ProductField::Description),
            overview: clean(ProductField::Overview),
            tutorial_link: clean(ProductField::TutorialLink),
            price: clean(ProductField::Price),
            enabled: form.enabled,
        }
    }

    pub fn validate_specification(&self, spec: &SpecificationInput) -> SpecificationCheck {
        let name = validate_field(&self.spec_name, &spec.name);
        let description = validate_field(&self.spec_description, &spec.description);

        // One message per spec field, matching what the list row shows.
        let mut errors = FieldErrors::new();
        errors.set(SpecField::Name, name.violations.into_iter().take(1).collect());
        errors.set(
            SpecField::Description,
            description.violations.into_iter().take(1).collect(),
        );

        SpecificationCheck {
            errors,
            sanitized: SpecificationInput {
                name: name.sanitized,
                description: description.sanitized,
            },
        }
    }

    /// Validate everything on the admin form in one pass.
    pub fn validate_product<'a, S, I>(
        &self,
        form: &ProductForm,
        specifications: S,
        images: I,
    ) -> ProductValidation
    where
        S: IntoIterator<Item = &'a SpecificationInput>,
        I: IntoIterator<Item = &'a ImageFile>,
    {
        let mut errors = ProductErrors::default();
        let mut clean = BTreeMap::new();

        for &field in ProductField::ALL {
            let outcome = validate_field(self.rule(field), field_value(form, field));
            errors.fields.set(field, outcome.violations);
            clean.insert(field, outcome.sanitized);
        }

        let specifications: Vec<_> = specifications.into_iter().collect();
        let mut sanitized_specs = None;
        if specifications.len() > MAX_SPECIFICATIONS {
            errors.specifications = Some(CollectionErrors::TooMany(Violation::too_many_items(
                "Specifications",
                MAX_SPECIFICATIONS,
            )));
        } else {
            let mut item_errors = BTreeMap::new();
            let mut cleaned = Vec::with_capacity(specifications.len());
            for (index, spec) in specifications.into_iter().enumerate() {
                let check = self.validate_specification(spec);
                if !check.is_valid() {
                    item_errors.insert(index, check.errors);
                }
                cleaned.push(check.sanitized);
            }
            if !item_errors.is_empty() {
                errors.specifications = Some(CollectionErrors::Items(item_errors));
            }
            sanitized_specs = Some(cleaned);
        }

        let images: Vec<_> = images.into_iter().collect();
        if images.len() > MAX_IMAGES {
            errors.images = Some(CollectionErrors::TooMany(Violation::new(
                ViolationKind::TooManyItems,
                format!("Cannot upload more than {MAX_IMAGES} files"),
            )));
        } else {
            let item_errors: BTreeMap<usize, Vec<Violation>> = images
                .into_iter()
                .enumerate()
                .map(|(index, file)| (index, validate_image_file(file)))
                .filter(|(_, violations)| !violations.is_empty())
                .collect();
            if !item_errors.is_empty() {
                errors.images = Some(CollectionErrors::Items(item_errors));
            }
        }

        let mut take = |field: ProductField| clean.remove(&field).unwrap_or_default();
        let sanitized = SanitizedProduct {
            name: take(ProductField::Name),
            summary: take(ProductField::Summary),
            description: take(ProductField::Description),
            overview: take(ProductField::Overview),
            tutorial_link: take(ProductField::TutorialLink),
            price: take(ProductField::Price),
            enabled: form.enabled,
            specifications: sanitized_specs,
        };

        ProductValidation {
            is_valid: errors.is_empty(),
            errors,
            sanitized,
        }
    }
}

impl Default for ProductRules {
    fn default() -> Self {
        Self::new(&FormsConfig::default())
    }
}

fn field_value(form: &ProductForm, field: ProductField) -> &str {
    match field {
        ProductField::Name => &form.name,
        ProductField::Summary => &form.summary,
        ProductField::Description => &form.description,
        ProductField::Overview => &form.overview,
        ProductField::Price => &form.price,
        ProductField::TutorialLink => &form.tutorial_link,
    }
}

fn has_blocked_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => BLOCKED_EXTENSIONS
            .iter()
            .any(|blocked| ext.eq_ignore_ascii_case(blocked)),
        None => false,
    }
}

/// Check file metadata only: size, declared type and file name.
pub fn validate_image_file(file: &ImageFile) -> Vec<Violation> {
    let mut violations = vec![];

    if file.size > MAX_IMAGE_BYTES {
        violations.push(Violation::new(
            ViolationKind::FileTooLarge,
            format!(
                "Image file size must not exceed {}MB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            ),
        ));
    }

    let allowed = ALLOWED_IMAGE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(file.mime_type.trim()));
    if !allowed {
        violations.push(Violation::new(
            ViolationKind::FileTypeNotAllowed,
            format!("Image must be one of: {}", ALLOWED_IMAGE_TYPES.join(", ")),
        ));
    }

    if has_blocked_extension(&file.name) {
        violations.push(Violation::new(
            ViolationKind::FileTypeNotAllowed,
            "File type not allowed for security reasons",
        ));
    }

    violations
}

pub fn validate_specification(spec: &SpecificationInput) -> SpecificationCheck {
    DEFAULT_RULES.validate_specification(spec)
}

pub fn validate_product<'a, S, I>(form: &ProductForm, specifications: S, images: I) -> ProductValidation
where
    S: IntoIterator<Item = &'a SpecificationInput>,
    I: IntoIterator<Item = &'a ImageFile>,
{
    DEFAULT_RULES.validate_product(form, specifications, images)
}
