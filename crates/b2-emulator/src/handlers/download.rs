//! Download handlers

use crate::store::FileVersion;
use crate::{AppState, EmulatorError};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use b2_client::encoding::{encode_file_name, AUTO_CONTENT_TYPE};
use b2_client::{BucketType, FileAction};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadByIdParams {
    pub file_id: String,
}

/// GET /b2api/v1/b2_download_file_by_id?fileId=..
pub async fn download_file_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<DownloadByIdParams>,
) -> Result<Response, EmulatorError> {
    let file = state
        .store
        .file(&params.file_id)
        .filter(|f| f.action == FileAction::Upload)
        .ok_or_else(|| EmulatorError::not_found(format!("File not present: {}", params.file_id)))?;

    check_download_access(&state, &headers, &file.info.bucket_id)?;
    debug!(file_id = %params.file_id, "download by id");

    file_response(file)
}

/// GET /file/{bucket_name}/{*file_name}
pub async fn download_file_by_name(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((bucket_name, file_name)): Path<(String, String)>,
) -> Result<Response, EmulatorError> {
    let bucket = state
        .store
        .bucket_by_name(&bucket_name)
        .ok_or_else(|| EmulatorError::not_found(format!("Bucket not found: {}", bucket_name)))?;

    check_download_access(&state, &headers, &bucket.bucket_id)?;

    let file = state
        .store
        .latest_visible(&bucket.bucket_id, &file_name)
        .ok_or_else(|| EmulatorError::not_found(format!("File not present: {}", file_name)))?;
    debug!(%bucket_name, %file_name, "download by name");

    file_response(file)
}

/// Public buckets serve anyone; private ones need an account token
fn check_download_access(state: &AppState, headers: &HeaderMap, bucket_id: &str) -> Result<(), EmulatorError> {
    match state.store.bucket(bucket_id) {
        Some(bucket) if bucket.bucket_type == BucketType::AllPublic => Ok(()),
        _ => state.check_token(headers),
    }
}

fn file_response(file: FileVersion) -> Result<Response, EmulatorError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, header_value(&served_content_type(&file))?);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.content.len()));
    headers.insert("x-bz-file-id", header_value(&file.info.file_id)?);
    headers.insert("x-bz-file-name", header_value(&encode_file_name(&file.info.file_name))?);
    headers.insert("x-bz-content-sha1", header_value(&file.info.content_sha1)?);

    for (key, value) in &file.info.info {
        let name = HeaderName::from_bytes(format!("x-bz-info-{}", key).as_bytes())
            .map_err(|e| EmulatorError::Internal(e.to_string()))?;
        headers.insert(name, header_value(value)?);
    }

    Ok((StatusCode::OK, headers, Body::from(file.content)).into_response())
}

/// Content type for the response, guessing from the name for `b2/x-auto`
fn served_content_type(file: &FileVersion) -> String {
    if file.info.content_type == AUTO_CONTENT_TYPE {
        mime_guess::from_path(&file.info.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    } else {
        file.info.content_type.clone()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, EmulatorError> {
    HeaderValue::from_str(value).map_err(|e| EmulatorError::Internal(e.to_string()))
}
