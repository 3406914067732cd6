//! Error types for logsplitter-core

use thiserror::Error;

/// Main error type for the logsplitter-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client construction or transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Identity provider could not mint a token
    #[error("identity error: {0}")]
    Identity(String),

    /// Client-side input validation failed before any request was sent
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// The current plan does not entitle this action
    #[error("{0}")]
    Entitlement(String),

    /// The owning scope was cancelled while the request was in flight
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Build a validation error for `field`.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// The offending input field, if this is a validation error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type alias for logsplitter-core
pub type Result<T> = std::result::Result<T, Error>;
