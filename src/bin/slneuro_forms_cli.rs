//! SL Neurorobotics Forms CLI - Bridge interface for the storefront backend
//!
//! Commands: sanitize, validate, submit
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure, 1 on usage or config errors

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use slneuro_forms::{
    faq::sanitize_faq, sanitize_email, sanitize_faq_answer, sanitize_faq_question, sanitize_input,
    sanitize_phone, sanitize_url, validate_faq, AuthRules, FaqForm, FormsConfig, ImageFile,
    LoginForm, ProductForm, ProductRules, SignupForm, SpecificationInput, SubmissionError,
    SubmissionGate,
};

#[derive(Parser)]
#[command(name = "slneuro-forms")]
#[command(about = "SL Neurorobotics Forms - validation and sanitization", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, default_value = "slneuro-forms.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize a single value
    Sanitize {
        #[arg(short, long, value_enum)]
        kind: SanitizeKind,

        #[arg(short, long, allow_hyphen_values = true)]
        value: String,

        /// Character cap for `--kind input`
        #[arg(long)]
        max_len: Option<usize>,
    },

    /// Validate a whole form
    Validate {
        #[arg(short, long, value_enum)]
        form: FormKind,

        /// JSON payload
        #[arg(short, long)]
        payload: String,
    },

    /// Validate, rate limit and build the request for a form
    Submit {
        #[arg(short, long, value_enum)]
        form: SubmitKind,

        /// JSON payload
        #[arg(short, long)]
        payload: String,

        /// Rate-limit key for product uploads
        #[arg(short, long, default_value = "default")]
        identifier: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SanitizeKind {
    Input,
    Email,
    Phone,
    Url,
    FaqQuestion,
    FaqAnswer,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormKind {
    Signup,
    Login,
    Faq,
    Product,
}

#[derive(Clone, Copy, ValueEnum)]
enum SubmitKind {
    Signup,
    Login,
    Product,
}

/// Product payload: form fields plus the two collections.
#[derive(Deserialize)]
struct ProductPayload {
    #[serde(flatten)]
    form: ProductForm,
    #[serde(default)]
    specifications: Vec<SpecificationInput>,
    #[serde(default)]
    images: Vec<ImageFile>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(value: &impl Serialize) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to encode output: {}"}}"#, e);
            false
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(payload: &str) -> Result<T, ExitCode> {
    serde_json::from_str(payload).map_err(|e| {
        emit(&serde_json::json!({
            "valid": false,
            "error": format!("Invalid payload: {e}"),
        }));
        ExitCode::FAILURE
    })
}

/// Print a validation report and map validity to the exit code.
fn report(valid: bool, errors: &impl Serialize, sanitized: &impl Serialize) -> ExitCode {
    let output = serde_json::json!({
        "valid": valid,
        "errors": errors,
        "sanitized": sanitized,
    });
    if !emit(&output) {
        return ExitCode::FAILURE;
    }
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2) // Validation failure
    }
}

fn sanitize(kind: SanitizeKind, value: &str, max_len: Option<usize>) -> ExitCode {
    let sanitized = match kind {
        SanitizeKind::Input => sanitize_input(value, max_len),
        SanitizeKind::Email => sanitize_email(value),
        SanitizeKind::Phone => sanitize_phone(value),
        SanitizeKind::Url => sanitize_url(value),
        SanitizeKind::FaqQuestion => sanitize_faq_question(value),
        SanitizeKind::FaqAnswer => sanitize_faq_answer(value),
    };
    if emit(&serde_json::json!({ "sanitized": sanitized })) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn validate(config: &FormsConfig, form: FormKind, payload: &str) -> Result<ExitCode, ExitCode> {
    let code = match form {
        FormKind::Signup => {
            let rules = AuthRules::new(config);
            let input: SignupForm = parse(payload)?;
            let errors = rules.validate_signup(&input);
            report(errors.is_empty(), &errors, &rules.sanitize_signup(&input))
        }
        FormKind::Login => {
            let rules = AuthRules::new(config);
            let input: LoginForm = parse(payload)?;
            let errors = rules.validate_login(&input);
            report(errors.is_empty(), &errors, &rules.sanitize_login(&input))
        }
        FormKind::Faq => {
            let input: FaqForm = parse(payload)?;
            let errors = validate_faq(&input);
            report(errors.is_empty(), &errors, &sanitize_faq(&input))
        }
        FormKind::Product => {
            let rules = ProductRules::new(config);
            let input: ProductPayload = parse(payload)?;
            let result = rules.validate_product(&input.form, &input.specifications, &input.images);
            report(result.is_valid, &result.errors, &result.sanitized)
        }
    };
    Ok(code)
}

fn submit(
    config: &FormsConfig,
    form: SubmitKind,
    payload: &str,
    identifier: &str,
) -> Result<ExitCode, ExitCode> {
    let mut gate = SubmissionGate::new(config);
    let outcome = match form {
        SubmitKind::Signup => {
            let input: SignupForm = parse(payload)?;
            gate.prepare_signup(&input).map(serde_json::to_value)
        }
        SubmitKind::Login => {
            let input: LoginForm = parse(payload)?;
            gate.prepare_login(&input).map(serde_json::to_value)
        }
        SubmitKind::Product => {
            let input: ProductPayload = parse(payload)?;
            gate.prepare_product(identifier, &input.form, &input.specifications, &input.images)
                .map(serde_json::to_value)
        }
    };

    let code = match outcome {
        Ok(Ok(submission)) => {
            let output = serde_json::json!({
                "success": true,
                "submission": submission,
            });
            if emit(&output) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Ok(Err(e)) => {
            eprintln!(r#"{{"error": "Failed to encode submission: {}"}}"#, e);
            ExitCode::FAILURE
        }
        Err(e) => {
            emit(&serde_json::json!({
                "success": false,
                "error": e.to_string(),
            }));
            match e {
                SubmissionError::ValidationFailed(_) | SubmissionError::RateLimited { .. } => {
                    ExitCode::from(2)
                }
                SubmissionError::Serialization(_) => ExitCode::FAILURE,
            }
        }
    };
    Ok(code)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match FormsConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load config: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Sanitize { kind, value, max_len } => Ok(sanitize(kind, &value, max_len)),
        Commands::Validate { form, payload } => validate(&config, form, &payload),
        Commands::Submit {
            form,
            payload,
            identifier,
        } => submit(&config, form, &payload, &identifier),
    };

    match result {
        Ok(code) | Err(code) => code,
    }
}
