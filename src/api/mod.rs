//! REST API module.
//!
//! Holds the response envelope shared by every endpoint and the post routes.

mod posts;

pub use posts::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{codes, messages, AppError};
use crate::logging::Logger;

/// Human-readable category of a status code, from its leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    #[serde(rename = "Client Error")]
    ClientError,
    #[serde(rename = "Server Error")]
    ServerError,
}

impl StatusClass {
    pub fn from_code(code: StatusCode) -> Self {
        match code.as_u16() / 100 {
            1 => StatusClass::Informational,
            2 => StatusClass::Success,
            3 => StatusClass::Redirection,
            4 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }
}

/// Envelope metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub success: bool,
    pub code: u16,
    pub status: StatusClass,
    pub message: String,
}

/// Uniform response envelope.
///
/// At most one of `data` and `errors` is set: validation failures (422) put
/// their payload under `errors`, every other code under `data`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl Envelope {
    pub fn format(code: StatusCode, message: &str, data: Option<Value>) -> Self {
        let mut envelope = Self {
            meta: Meta {
                success: code.is_success(),
                code: code.as_u16(),
                status: StatusClass::from_code(code),
                message: message.to_string(),
            },
            data: None,
            errors: None,
        };

        match data {
            Some(Value::Null) | None => {}
            Some(payload) if code == codes::VALIDATION_ERROR => envelope.errors = Some(payload),
            Some(payload) => envelope.data = Some(payload),
        }

        envelope
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.meta.code).unwrap_or(codes::SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Response type for handlers: a rendered envelope or a carrier for the error layer.
pub type ApiResult = Result<Response, AppError>;

/// Create a 200 success envelope. Logs `message` at info.
pub fn success<T: Serialize>(logger: &Logger, message: &str, data: T) -> ApiResult {
    success_with_code(logger, codes::SUCCESS, message, data)
}

/// Create a success envelope with an explicit code. Logs `message` at info.
pub fn success_with_code<T: Serialize>(
    logger: &Logger,
    code: StatusCode,
    message: &str,
    data: T,
) -> ApiResult {
    let data = serde_json::to_value(data)?;
    logger.info(message);
    Ok(Envelope::format(code, message, Some(data)).into_response())
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::not_found(messages::NOT_FOUND)
}

/// Create an error envelope. Never logs; the error layer owns error logging.
pub fn error_response(code: StatusCode, message: &str, data: Option<Value>) -> Response {
    Envelope::format(code, message, data).into_response()
}
