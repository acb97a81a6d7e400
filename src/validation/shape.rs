//! Shape-driven validation for JSON request bodies.
//!
//! The raw body is first deserialized into the target type, then its
//! `validator::Validate` constraints run. Nested violations are flattened into
//! dotted field paths (`author.email`, `tags.0`).

use std::marker::PhantomData;

use axum::{
    extract::{FromRequest, Request},
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::{capitalize, Checked, FieldError, Validator};
use crate::api::error_response;
use crate::errors::{codes, messages};

/// Field name used when the body as a whole cannot take the target shape.
pub const BODY_FIELD: &str = "body";

/// Validates raw JSON against the shape of `T`.
#[derive(Debug, Clone, Copy)]
pub struct ShapeValidator<T> {
    _shape: PhantomData<fn() -> T>,
}

impl<T> Default for ShapeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ShapeValidator<T> {
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Validate> Validator for ShapeValidator<T> {
    type Output = T;

    fn check(&self, raw: Value) -> Checked<T> {
        let value: T = match serde_json::from_value(raw) {
            Ok(value) => value,
            Err(e) => {
                return Checked::invalid(None, vec![FieldError::new(BODY_FIELD, capitalize(&e.to_string()))]);
            }
        };

        match value.validate() {
            Ok(()) => Checked::valid(value),
            Err(errors) => Checked::invalid(Some(value), flatten_errors(&errors)),
        }
    }
}

/// Flatten a violation tree into dotted-path field errors, sorted by path.
pub fn flatten_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect_errors(errors, "", &mut out);
    out
}

fn collect_errors(errors: &ValidationErrors, parent: &str, out: &mut Vec<FieldError>) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (property, kind) in entries {
        let property: &str = property;
        let path = if parent.is_empty() {
            property.to_string()
        } else {
            format!("{}.{}", parent, property)
        };

        match kind {
            // One message per field: the last constraint declared wins.
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.last() {
                    out.push(FieldError::new(path, describe(property, error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_errors(nested, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

/// Human-readable message for one constraint violation.
fn describe(property: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let label = capitalize(property);
    let param = |name: &str| error.params.get(name).map(|v| v.to_string());

    match error.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("{} length must be between {} and {} characters", label, min, max)
            }
            (Some(min), None) => format!("{} length must be at least {} characters", label, min),
            (None, Some(max)) => format!("{} length must be at most {} characters", label, max),
            (None, None) => format!("{} has an invalid length", label),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("{} must be between {} and {}", label, min, max),
            (Some(min), None) => format!("{} must be greater than or equal to {}", label, min),
            (None, Some(max)) => format!("{} must be less than or equal to {}", label, max),
            (None, None) => format!("{} is out of range", label),
        },
        "email" => format!("{} must be an email", label),
        "url" => format!("{} must be a URL address", label),
        "required" => format!("{} is required", label),
        code => format!("{} is invalid ({})", label, code),
    }
}

/// JSON body extractor that validates against the shape of `T`.
///
/// Rejections are the finished envelope: the request ends here and never
/// reaches the handler or the error layer. Unparsable JSON gets a 400, a
/// body of the wrong shape or with constraint violations gets a 422.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| error_response(rejection.status(), &rejection.body_text(), None))?;

        let checked = ShapeValidator::<T>::new().check(raw);
        if !checked.errors.is_empty() {
            let payload = serde_json::to_value(&checked.errors).ok();
            return Err(error_response(
                codes::VALIDATION_ERROR,
                messages::VALIDATION_ERROR,
                payload,
            ));
        }

        match checked.value {
            Some(value) => Ok(Self(value)),
            None => Err(error_response(
                codes::SERVER_ERROR,
                messages::SERVER_ERROR,
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationMode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Validate)]
    struct Author {
        #[validate(email)]
        email: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct NewPost {
        #[validate(length(min = 1, max = 120))]
        title: String,
        #[validate(length(min = 10))]
        content: String,
        #[validate(nested)]
        author: Author,
    }

    #[test]
    fn test_valid_shape() {
        let post = ShapeValidator::<NewPost>::new()
            .validate(json!({
                "title": "Hello",
                "content": "Long enough content",
                "author": {"email": "writer@example.com"}
            }))
            .unwrap();
        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn test_nested_errors_use_dotted_paths() {
        let checked = ShapeValidator::<NewPost>::new().check(json!({
            "title": "",
            "content": "short",
            "author": {"email": "not-an-email"}
        }));

        let fields: Vec<&str> = checked.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["author.email", "content", "title"]);
        assert_eq!(checked.errors[0].message, "Email must be an email");
        assert_eq!(
            checked.errors[1].message,
            "Content length must be at least 10 characters"
        );
        assert_eq!(
            checked.errors[2].message,
            "Title length must be between 1 and 120 characters"
        );
    }

    #[test]
    fn test_wrong_shape_reports_body() {
        let checked = ShapeValidator::<NewPost>::new().check(json!({"title": 5}));
        assert!(checked.value.is_none());
        assert_eq!(checked.errors.len(), 1);
        assert_eq!(checked.errors[0].field, BODY_FIELD);
    }

    #[test]
    fn test_collect_only_keeps_value() {
        let checked = ShapeValidator::<NewPost>::new()
            .check_with(
                json!({
                    "title": "Ok",
                    "content": "tiny",
                    "author": {"email": "writer@example.com"}
                }),
                ValidationMode::CollectOnly,
            )
            .unwrap();
        assert_eq!(checked.errors.len(), 1);
        assert_eq!(checked.value.unwrap().content, "tiny");
    }

    #[test]
    fn test_custom_message_preserved() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("custom");
        error.message = Some("Slug is taken".into());
        errors.add("slug", error);

        assert_eq!(
            flatten_errors(&errors),
            vec![FieldError::new("slug", "Slug is taken")]
        );
    }
}
