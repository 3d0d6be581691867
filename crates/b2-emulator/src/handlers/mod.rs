//! B2 API request handlers

pub mod account;
pub mod bucket;
pub mod download;
pub mod file;

pub use account::*;
pub use bucket::*;
pub use download::*;
pub use file::*;

use crate::error::EmulatorError;
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Decode a JSON request body
///
/// Bodies are taken as raw bytes so malformed JSON becomes a B2 `bad_request`
/// instead of axum's plain-text rejection.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, EmulatorError> {
    serde_json::from_slice(body)
        .map_err(|e| EmulatorError::bad_request(format!("Invalid request body: {}", e)))
}
