//! Schema-driven validation for query strings and path parameters.
//!
//! Raw values arrive as strings. Each declared field is coerced to its type,
//! checked against its bounds and defaulted when absent. Every field is
//! checked; a field reports only its first violated rule.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use super::{capitalize, Checked, FieldError, Validator};

/// Largest integer a JSON number holds without precision loss (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    String,
}

/// Declarative rules for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
    default: Option<Value>,
    allow_empty: bool,
    allow_null: bool,
}

impl FieldRule {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            min: None,
            max: None,
            default: None,
            allow_empty: false,
            allow_null: false,
        }
    }

    pub fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    pub fn number() -> Self {
        Self::of(FieldKind::Number)
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Lower bound for numbers, minimum length for strings.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound for numbers, maximum length for strings.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Value used when the field is absent. Defaults are not re-validated.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept `""` for string fields.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Accept an explicit `null`.
    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Coerce and check a present value.
    fn apply(&self, label: &str, raw: &Value) -> Result<Value, String> {
        if raw.is_null() {
            return if self.allow_null {
                Ok(Value::Null)
            } else {
                Err(self.type_message(label))
            };
        }

        match self.kind {
            FieldKind::Integer | FieldKind::Number => self.apply_number(label, raw),
            FieldKind::String => self.apply_string(label, raw),
        }
    }

    fn apply_number(&self, label: &str, raw: &Value) -> Result<Value, String> {
        let number = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or_else(|| self.type_message(label))?;

        if self.kind == FieldKind::Integer && number.fract() != 0.0 {
            return Err(format!("{} must be an integer", label));
        }
        if number.abs() > MAX_SAFE_INTEGER {
            return Err(format!("{} must be a safe number", label));
        }
        if let Some(min) = self.min.filter(|min| number < *min) {
            return Err(format!("{} must be greater than or equal to {}", label, min));
        }
        if let Some(max) = self.max.filter(|max| number > *max) {
            return Err(format!("{} must be less than or equal to {}", label, max));
        }

        if self.kind == FieldKind::Integer {
            Ok(Value::Number(Number::from(number as i64)))
        } else {
            Number::from_f64(number)
                .map(Value::Number)
                .ok_or_else(|| self.type_message(label))
        }
    }

    fn apply_string(&self, label: &str, raw: &Value) -> Result<Value, String> {
        let Value::String(s) = raw else {
            return Err(self.type_message(label));
        };

        if s.is_empty() {
            return if self.allow_empty {
                Ok(Value::String(String::new()))
            } else {
                Err(format!("{} is not allowed to be empty", label))
            };
        }

        let length = s.chars().count() as f64;
        if let Some(min) = self.min.filter(|min| length < *min) {
            return Err(format!(
                "{} length must be at least {} characters long",
                label, min
            ));
        }
        if let Some(max) = self.max.filter(|max| length > *max) {
            return Err(format!(
                "{} length must be less than or equal to {} characters long",
                label, max
            ));
        }

        Ok(Value::String(s.clone()))
    }

    fn type_message(&self, label: &str) -> String {
        match self.kind {
            FieldKind::Integer | FieldKind::Number => format!("{} must be a number", label),
            FieldKind::String => format!("{} must be a string", label),
        }
    }
}

/// Declarative schema producing a typed `T` from untyped input.
#[derive(Debug, Clone)]
pub struct SchemaValidator<T> {
    fields: Vec<(String, FieldRule)>,
    allow_unknown: bool,
    _output: PhantomData<fn() -> T>,
}

impl<T> Default for SchemaValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SchemaValidator<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            allow_unknown: false,
            _output: PhantomData,
        }
    }

    /// Declare a field. Fields are checked and reported in declaration order.
    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }

    /// Ignore input keys the schema does not declare instead of rejecting them.
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Coerce, default and check `raw` without converting to `T`.
    pub fn check_object(&self, raw: &Value) -> (Map<String, Value>, Vec<FieldError>) {
        let mut output = Map::new();
        let mut errors = Vec::new();

        let Value::Object(input) = raw else {
            errors.push(FieldError::new("value", "Value must be of type object"));
            return (output, errors);
        };

        for (name, rule) in &self.fields {
            let label = capitalize(name);
            match input.get(name) {
                Some(value) => match rule.apply(&label, value) {
                    Ok(coerced) => {
                        output.insert(name.clone(), coerced);
                    }
                    Err(message) => {
                        errors.push(FieldError::new(name.clone(), message));
                        // keep the output convertible for collect-only callers
                        if let Some(default) = &rule.default {
                            output.insert(name.clone(), default.clone());
                        }
                    }
                },
                None if rule.required => {
                    errors.push(FieldError::new(name.clone(), format!("{} is required", label)));
                }
                None => {
                    if let Some(default) = &rule.default {
                        output.insert(name.clone(), default.clone());
                    }
                }
            }
        }

        for (key, value) in input {
            if self.fields.iter().any(|(name, _)| name == key) {
                continue;
            }
            if self.allow_unknown {
                output.insert(key.clone(), value.clone());
            } else {
                errors.push(FieldError::new(
                    key.clone(),
                    format!("{} is not allowed", capitalize(key)),
                ));
            }
        }

        (output, errors)
    }
}

impl<T: DeserializeOwned> Validator for SchemaValidator<T> {
    type Output = T;

    fn check(&self, raw: Value) -> Checked<T> {
        let (output, errors) = self.check_object(&raw);
        let value = serde_json::from_value(Value::Object(output)).ok();

        if errors.is_empty() {
            match value {
                Some(value) => Checked::valid(value),
                None => Checked::invalid(None, errors),
            }
        } else {
            Checked::invalid(value, errors)
        }
    }
}
