//! Error types for the Apstra MCP crates

use serde_json::Value;
use thiserror::Error;

/// Main error type for Apstra operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed: {status} - {body}")]
    Http { status: u16, body: String },

    /// Upstream JSON did not have the expected shape. `raw` keeps the
    /// payload so callers can echo it back in an error envelope.
    #[error("Unexpected data format from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: String,
        reason: String,
        raw: Value,
    },

    #[error("{kind} '{identifier}' not found")]
    NotFound {
        kind: &'static str,
        identifier: String,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a not found error for a resource kind ("Blueprint", ...)
    pub fn not_found(kind: &'static str, identifier: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>, raw: Value) -> Self {
        Error::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
            raw,
        }
    }

    /// Errors that should reach the user verbatim, without an action prefix
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::InvalidArgument(_))
    }
}
