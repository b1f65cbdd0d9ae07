//! Error handling module
//!
//! Defines the error taxonomy surfaced by the request-dispatch runtime

use crate::models::ApiResponse;
use thiserror::Error;

/// Runtime error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// A mandatory header/query value was not supplied at instantiation
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Invalid descriptor or client configuration, detected before any call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every attempt of a call timed out
    #[error("Request timed out after {attempts} attempts")]
    TimeoutExhausted { attempts: u32 },

    /// Non-timeout transport failure, never retried
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error response for which no handler is registered
    #[error("Unhandled API error: status {status}")]
    UnhandledApiError { status: u16, response: ApiResponse },

    /// Operation not declared in the descriptor
    #[error("Unknown API method: {0}")]
    UnknownMethod(String),

    /// Pagination requested for an operation declared without it
    #[error("API method is not paginated: {0}")]
    NotPaginated(String),

    /// Failure raised by a user error handler or paginator
    #[error("Handler failed: {0}")]
    Handler(#[from] anyhow::Error),

    /// Response body decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Stable error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingRequiredField(_) => "missing_required_field",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::TimeoutExhausted { .. } => "timeout_exhausted",
            ApiError::Transport(_) => "transport_error",
            ApiError::UnhandledApiError { .. } => "unhandled_api_error",
            ApiError::UnknownMethod(_) | ApiError::NotPaginated(_) => "invalid_call",
            ApiError::Handler(_) => "handler_error",
            ApiError::Serialization(_) => "serialization_error",
        }
    }

    /// HTTP status carried by the error, if it came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::UnhandledApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response carried by the error, if any
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ApiError::UnhandledApiError { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        // Missing fields may name credentials; keep them terse
        !matches!(self, ApiError::MissingRequiredField(_))
    }
}

/// Result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Error construction helpers
pub mod helpers {
    use super::*;

    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> ApiError {
        ApiError::Configuration(message.into())
    }

    /// Create transport error
    pub fn transport_error(message: impl Into<String>) -> ApiError {
        ApiError::Transport(message.into())
    }

    /// Create missing field error
    pub fn missing_field(key: impl Into<String>) -> ApiError {
        ApiError::MissingRequiredField(key.into())
    }
}

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add configuration error context
    fn config_context(self, message: &str) -> ApiResult<T>;

    /// Add transport error context
    fn transport_context(self, message: &str) -> ApiResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn config_context(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| ApiError::Configuration(format!("{}: {}", message, e)))
    }

    fn transport_context(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| ApiError::Transport(format!("{}: {}", message, e)))
    }
}
