//! Error handling module for the blog API.
//!
//! Every failure (validation, lookup miss, unexpected fault) travels as an
//! [`AppError`] until the terminal error layer renders it into an envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::validation::FieldError;

/// Status codes used by the API.
pub mod codes {
    use axum::http::StatusCode;

    pub const SUCCESS: StatusCode = StatusCode::OK;
    pub const CLIENT_ERROR: StatusCode = StatusCode::BAD_REQUEST;
    pub const NOT_FOUND: StatusCode = StatusCode::NOT_FOUND;
    pub const VALIDATION_ERROR: StatusCode = StatusCode::UNPROCESSABLE_ENTITY;
    pub const SERVER_ERROR: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;
}

/// Fixed messages shared by several error sites.
pub mod messages {
    pub const VALIDATION_ERROR: &str = "Validation Error";
    pub const SERVER_ERROR: &str = "Internal Server Error";
    pub const NOT_FOUND: &str = "Not Found";
}

/// Application error carrier.
///
/// Immutable once built. `payload` is the machine-readable part of the
/// failure: the field error list for validation failures, `None` otherwise.
#[derive(Debug, Clone)]
pub struct AppError {
    message: String,
    payload: Option<Value>,
    status: StatusCode,
}

impl AppError {
    /// Build a carrier from its three parts.
    pub fn new(message: impl Into<String>, payload: Option<Value>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            payload,
            status,
        }
    }

    /// Unclassified failure; 500 is the carrier's default status.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, None, codes::SERVER_ERROR)
    }

    /// Single resource miss.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, None, codes::NOT_FOUND)
    }

    /// Generic malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, None, codes::CLIENT_ERROR)
    }

    /// Field-level validation failure carrying every violation found.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let payload = serde_json::to_value(errors).ok();
        Self::new(messages::VALIDATION_ERROR, payload, codes::VALIDATION_ERROR)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status belongs to the 5xx class.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

impl Default for AppError {
    fn default() -> Self {
        Self::internal(messages::SERVER_ERROR)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("JSON error: {}", err))
    }
}

/// Hands the carrier to the error layer.
///
/// The response produced here only has the status set; the carrier rides in
/// the response extensions and `middleware::render_errors` turns it into the
/// envelope. That layer is the single place errors are logged and written.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
