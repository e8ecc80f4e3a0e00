//! Error Types for the feedline API
//!
//! This module defines the error surface callers see:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - Conversions from the engine's [`FeedError`]
//!
//! All errors serialize as JSON and carry an HTTP-style status code.

use feedline_core::{FeedError, StorageError, ValidationError};
use feedline_storage::FixtureError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to an HTTP status code and represents a category of
/// error that can occur while serving a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Input document (fixture, arguments) is malformed
    InvalidInput,

    // ========================================================================
    // Server Errors (500, 503, 504)
    // ========================================================================
    /// Internal invariant violated
    InternalError,

    /// Storage collaborator failed
    StorageFailure,

    /// Storage collaborator timed out
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput => 400,
            ErrorCode::InternalError => 500,
            ErrorCode::StorageFailure => 503,
            ErrorCode::Timeout => 504,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageFailure => "Storage temporarily unavailable",
            ErrorCode::Timeout => "Operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field and the like)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// CONVERSIONS FROM ENGINE ERRORS
// ============================================================================

fn offending_field(err: &ValidationError) -> Option<&str> {
    match err {
        ValidationError::InvalidValue { field, .. } | ValidationError::InvalidCursor { field, .. } => {
            Some(field.as_str())
        }
        ValidationError::InvalidTypeUri { .. } => Some("types"),
        ValidationError::InvalidLimit { .. } => Some("limit"),
        ValidationError::ConflictingCursors { .. } => None,
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Validation(validation) => {
                let api = ApiError::validation_failed(validation.to_string());
                match offending_field(&validation) {
                    Some(field) => api.with_details(serde_json::json!({ "field": field })),
                    None => api,
                }
            }
            FeedError::Storage(StorageError::Timeout { table, elapsed_ms }) => {
                tracing::error!(%table, elapsed_ms, "Storage timeout");
                ApiError::new(
                    ErrorCode::Timeout,
                    format!("Query against {} timed out", table),
                )
            }
            FeedError::Storage(storage) => {
                tracing::error!(error = %storage, "Storage failure");
                ApiError::from_code(ErrorCode::StorageFailure)
            }
            // Internal and config failures never leak details to callers.
            other => {
                tracing::error!(error = %other, "Internal failure while serving feed");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

/// Convert from FixtureError to ApiError.
impl From<FixtureError> for ApiError {
    fn from(err: FixtureError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::internal_error(format!("Failed to serialize response: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use feedline_core::InternalError;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), 400);
        assert_eq!(ErrorCode::InvalidInput.status_code(), 400);
        assert_eq!(ErrorCode::InternalError.status_code(), 500);
        assert_eq!(ErrorCode::StorageFailure.status_code(), 503);
        assert_eq!(ErrorCode::Timeout.status_code(), 504);
    }

    #[test]
    fn test_validation_error_carries_field() {
        let err: ApiError = FeedError::from(ValidationError::InvalidCursor {
            field: "before".to_string(),
            value: "noon".to_string(),
            reason: "timestamp must be an integer".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("before"));
        assert_eq!(err.details, Some(serde_json::json!({ "field": "before" })));
    }

    #[test]
    fn test_storage_errors_map_by_kind() {
        let timeout: ApiError = FeedError::from(StorageError::Timeout {
            table: "posts".to_string(),
            elapsed_ms: 1500,
        })
        .into();
        assert_eq!(timeout.status_code(), 504);

        let failed: ApiError = FeedError::from(StorageError::QueryFailed {
            table: "posts".to_string(),
            reason: "connection reset".to_string(),
        })
        .into();
        assert_eq!(failed.code, ErrorCode::StorageFailure);
        assert!(!failed.message.contains("connection reset"));
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err: ApiError = FeedError::from(InternalError::BindingMismatch {
            placeholders: 3,
            bindings: 2,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::validation_failed("Invalid limit");
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("VALIDATION_FAILED"));
        assert!(json.contains("Invalid limit"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::from_code(ErrorCode::StorageFailure);
        let display = format!("{}", err);
        assert!(display.contains("StorageFailure"));
        assert!(display.contains("unavailable"));
    }
}
