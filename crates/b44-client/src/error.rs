//! Client error types.

use serde_json::Value;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    ///
    /// The underlying transport error is carried unchanged.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// Human-readable message (problem-details `title`, or `HTTP <status> <reason>`).
        message: String,
        /// HTTP status code, or the `status` member of a problem document.
        status: u16,
        /// Machine-readable code (problem-details `type`), when present.
        code: Option<String>,
        /// Structured payload: the full problem document, or the raw body.
        data: Option<Value>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// RFC 7807 problem-details document, as far as this client cares about it.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ProblemDetails {
    pub title: Option<String>,
    pub status: Option<u16>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
