//! Error handling module for the dive log backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_KEY: &str = "DUPLICATE_KEY";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// One message per failing field, in submission order
    Validation(Vec<String>),
    /// A dive with this number already exists
    DuplicateKey(i64),
    /// Resource not found
    NotFound(String),
    /// Persistence failure
    Database(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Shorthand for a validation error carrying a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn dive_not_found(dive_number: i64) -> Self {
        AppError::NotFound(format!("Dive {} not found", dive_number))
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::DuplicateKey(_) => codes::DUPLICATE_KEY,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(errors) => match errors.as_slice() {
                [single] => single.clone(),
                _ => format!("Submission had {} errors", errors.len()),
            },
            AppError::DuplicateKey(number) => {
                format!("Dive number {} is already in use", number)
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation(errors) => Some(serde_json::json!({ "errors": errors })),
            AppError::DuplicateKey(number) => Some(serde_json::json!({ "diveNumber": number })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::DuplicateKey(12);
        assert_eq!(
            err.to_string(),
            "DUPLICATE_KEY: Dive number 12 is already in use"
        );

        let err = AppError::dive_not_found(7);
        assert_eq!(err.to_string(), "NOT_FOUND: Dive 7 not found");

        let err = AppError::invalid("Dive number must not be empty.");
        assert_eq!(
            err.to_string(),
            "VALIDATION_ERROR: Dive number must not be empty."
        );
    }

    #[test]
    fn test_status_codes_are_distinct_per_outcome() {
        assert_eq!(
            AppError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateKey(1).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::dive_not_found(1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("locked".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_envelope_lists_every_message() {
        let err = AppError::Validation(vec!["first".into(), "second".into()]);
        let body = ErrorResponse::new(&err);
        assert!(!body.success);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert_eq!(body.error.message, "Submission had 2 errors");
        let details = body.error.details.unwrap();
        assert_eq!(details["errors"][0], "first");
        assert_eq!(details["errors"][1], "second");
    }
}
