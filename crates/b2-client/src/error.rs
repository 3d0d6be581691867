//! Client error types

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Structured error returned by the service on any non-200 response
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code, e.g. `bad_auth_token`
    #[serde(default)]
    pub code: String,
    /// Human-readable description
    #[serde(default)]
    pub message: String,
    /// HTTP status echoed in the body
    #[serde(default)]
    pub status: u16,
}

impl ApiError {
    /// The token was rejected (expired or wrong scope)
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
            || matches!(
                self.code.as_str(),
                "unauthorized" | "bad_auth_token" | "expired_auth_token"
            )
    }

    /// The addressed bucket or file does not exist
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code == "not_found"
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "code: '{}' status: '{}' message: '{}'",
            self.code, self.status, self.message
        )
    }
}

impl std::error::Error for ApiError {}

/// Coarse classification of a [`ClientError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The round trip itself failed
    Transport,
    /// The service rejected the request
    Api,
    /// A local precondition failed before any network call
    Configuration,
    /// A response could not be parsed into the expected shape
    Decode,
}

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Writing to the download sink or reading the upload source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// B2 API error
    #[error("B2 error: {0}")]
    Api(ApiError),

    /// Invalid configuration or call arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body or headers did not have the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Io(_) => ErrorKind::Transport,
            Self::Api(_) => ErrorKind::Api,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Decode(_) | Self::Json(_) => ErrorKind::Decode,
        }
    }

    /// The structured service error, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Check if the service rejected the authorization token
    pub fn is_unauthorized(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_unauthorized)
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}
