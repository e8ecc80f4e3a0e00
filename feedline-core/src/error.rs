//! Error types for feedline operations

use thiserror::Error;

/// Request validation errors.
///
/// These are caller mistakes: the request is rejected as a whole and nothing
/// is executed against storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid cursor for {field}: {value:?} ({reason})")]
    InvalidCursor {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid type URI {uri:?}: {reason}")]
    InvalidTypeUri { uri: String, reason: String },

    #[error("Invalid limit {value:?}: must be an integer")]
    InvalidLimit { value: String },

    #[error("Incompatible cursors: {cursor_a} and {cursor_b} cannot be combined")]
    ConflictingCursors { cursor_a: String, cursor_b: String },
}

/// Storage collaborator errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Query against {table} failed: {reason}")]
    QueryFailed { table: String, reason: String },

    #[error("Query against {table} timed out after {elapsed_ms}ms")]
    Timeout { table: String, elapsed_ms: u64 },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Programming invariant violations. Never returned to clients as data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InternalError {
    #[error("Condition has {placeholders} placeholders but {bindings} bindings")]
    BindingMismatch { placeholders: usize, bindings: usize },

    #[error("Binding at position {position} has the wrong shape: {reason}")]
    BindingShape { position: usize, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all feedline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl FeedError {
    /// True when the error is the caller's fault and the request should be rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self, FeedError::Validation(_))
    }
}

/// Result type alias for feedline operations.
pub type FeedResult<T> = Result<T, FeedError>;

// =============================================================================
// TESTS
// =============================================================================
