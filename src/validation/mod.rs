//! Input validation.
//!
//! Two strategies share one [`Validator`] capability and one error shape:
//!
//! - [`SchemaValidator`]: declarative field rules for query strings and path
//!   parameters. Coerces strings to numbers, fills defaults, collects every
//!   violation.
//! - [`ShapeValidator`]: deserializes a JSON body into a `validator::Validate`
//!   type and flattens nested violations into dotted paths.
//!
//! Both produce `Vec<FieldError>`. Callers pick [`ValidationMode::Raise`] to
//! abort with a 422 carrier, or [`ValidationMode::CollectOnly`] to inspect
//! the outcome without leaving the happy path.

mod schema;
mod shape;

pub use schema::*;
pub use shape::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// A single violation tied to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name; nested fields use a dotted path such as `author.email`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Whether a failed validation aborts the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Turn violations into a 422 [`AppError`].
    #[default]
    Raise,
    /// Hand back the outcome, violations included, without failing.
    CollectOnly,
}

/// Outcome of a validation run.
#[derive(Debug, Clone)]
pub struct Checked<T> {
    /// The typed value, when the input could be converted at all
    pub value: Option<T>,
    pub errors: Vec<FieldError>,
}

impl<T> Checked<T> {
    pub fn valid(value: T) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    pub fn invalid(value: Option<T>, errors: Vec<FieldError>) -> Self {
        Self { value, errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.value.is_some()
    }

    /// Collapse into the typed value or a validation carrier.
    pub fn into_result(self) -> Result<T, AppError> {
        if !self.errors.is_empty() {
            return Err(AppError::validation(self.errors));
        }
        self.value
            .ok_or_else(|| AppError::internal("validated input could not be converted"))
    }
}

/// Validation capability shared by both strategies.
pub trait Validator {
    type Output;

    /// Run every rule against `raw` and report all violations.
    fn check(&self, raw: Value) -> Checked<Self::Output>;

    /// Run the rules, failing only when `mode` is [`ValidationMode::Raise`].
    fn check_with(&self, raw: Value, mode: ValidationMode) -> Result<Checked<Self::Output>, AppError> {
        let checked = self.check(raw);
        match mode {
            ValidationMode::Raise if !checked.errors.is_empty() => {
                Err(AppError::validation(checked.errors))
            }
            _ => Ok(checked),
        }
    }

    /// Run the rules and return the typed value, or a 422 carrier.
    fn validate(&self, raw: Value) -> Result<Self::Output, AppError> {
        self.check(raw).into_result()
    }
}

/// Upper-case the first letter of a field name for messages: `perPage` -> `PerPage`.
pub fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn raw `key=value` pairs from a query string or path into a JSON object.
///
/// Later duplicates win.
pub fn pairs_to_value<I, K, V>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Value::Object(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect(),
    )
}
