//! Error types for the Readability API client.
//!
//! # Design
//! Credential problems (`Config`, `Validation`) are detected locally and never
//! reach the network. `Http` carries the status code and the Provider's
//! message for the known error statuses; every other status is handed back to
//! the sub-client as a normal response. `Transport` covers DNS and connection
//! failures, which callers see as an HTTP-kind error without a status.

use thiserror::Error;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The Provider (or the connection to it) failed the request.
    Http,
    /// Developer credentials are missing from the configuration.
    Config,
    /// A client was constructed with incomplete session credentials.
    Validation,
    /// The Provider replied successfully but not in the expected shape.
    ResponseShape,
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Consumer key/secret or parser token not configured.
    #[error("{0}")]
    Config(String),

    /// Session token or secret missing when building a reader client.
    #[error("{0}")]
    Validation(String),

    /// The Provider returned one of the known error statuses.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A successful response lacked something the client needs to continue.
    #[error("unexpected response: {0}")]
    ResponseShape(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub(crate) fn reader_credentials_missing() -> Self {
        ApiError::Config(
            "The Readability API must be configured with a developer key and secret before it can be used"
                .to_string(),
        )
    }

    pub(crate) fn parser_token_missing() -> Self {
        ApiError::Config(
            "The Readability API must be configured with a parser token before it can be used"
                .to_string(),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http { .. } | ApiError::Transport(_) => ErrorKind::Http,
            ApiError::Config(_) => ErrorKind::Config,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::ResponseShape(_) | ApiError::Deserialization(_) => ErrorKind::ResponseShape,
        }
    }

    /// Status code of the Provider's error response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
