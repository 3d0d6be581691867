//! Error types and B2 error codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// B2 error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum B2ErrorCode {
    BadRequest,
    BadAuthToken,
    Unauthorized,
    NotFound,
    DuplicateBucketName,
    CannotDeleteNonEmptyBucket,
    InternalError,
}

impl B2ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::BadAuthToken => "bad_auth_token",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::DuplicateBucketName => "duplicate_bucket_name",
            Self::CannotDeleteNonEmptyBucket => "cannot_delete_non_empty_bucket",
            Self::InternalError => "internal_error",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest | Self::DuplicateBucketName | Self::CannotDeleteNonEmptyBucket => {
                StatusCode::BAD_REQUEST
            }
            Self::BadAuthToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Emulator error type
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("{message}")]
    B2 { code: B2ErrorCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EmulatorError {
    /// Create a new B2 error
    pub fn b2(code: B2ErrorCode, message: impl Into<String>) -> Self {
        Self::B2 {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::b2(B2ErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::b2(B2ErrorCode::NotFound, message)
    }

    /// Get the error code
    pub fn error_code(&self) -> B2ErrorCode {
        match self {
            Self::B2 { code, .. } => *code,
            Self::Internal(_) => B2ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for EmulatorError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = code.status_code();
        let body = json!({
            "code": code.as_str(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
