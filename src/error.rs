//! Error types and handling for pullflow
//!
//! Exhaustion is never an error: it is reported through `Cursor::valid()` or the
//! `Option` returned by single-step accessors.

/// Main error type for flow operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    /// Malformed construction input, raised at the call that received it
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// An operation met an element it cannot handle, raised at the pull that reached it
    #[error("{operation}: {message}")]
    Precondition {
        operation: &'static str,
        message: String,
    },
    /// Failure reported by a user-supplied callback
    #[error("Callback failed: {0}")]
    Callback(String),
    /// Malformed JSON handed to a JSON source
    #[error("JSON error: {0}")]
    Json(String),
    /// Custom error with message
    #[error("Flow error: {0}")]
    Custom(String),
}

impl FlowError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        FlowError::InvalidArgument(message.into())
    }

    pub fn precondition(operation: &'static str, message: impl Into<String>) -> Self {
        FlowError::Precondition {
            operation,
            message: message.into(),
        }
    }

    pub fn callback(message: impl Into<String>) -> Self {
        FlowError::Callback(message.into())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Json(err.to_string())
    }
}

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
