//! Errors raised while talking to the chat backend.

use thiserror::Error;

/// Backend client error.
///
/// The variants exist for logging; the chat view collapses all of them into a
/// single inline error message.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure (connection refused, DNS, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not the expected JSON.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend answered with a non-success status.
    #[error("{body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, or the status line when the body was empty.
        body: String,
    },
}

impl BackendError {
    /// Short label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(_) => "transport",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Decode(_) => "decode",
            Self::Status { .. } => "status",
        }
    }
}
