//! Upload, listing and file metadata handlers

use super::parse_body;
use crate::store::{page_size, NewUpload};
use crate::{AppState, EmulatorError};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use b2_client::encoding::{decode_file_name, API_PREFIX, AUTO_CONTENT_TYPE};
use b2_client::{FileInfo, FileName};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Lowercase form of the info header prefix, as stored in a `HeaderMap`
const INFO_PREFIX: &str = "x-bz-info-";

/// Sentinel SHA-1 value that skips content verification
const DO_NOT_VERIFY: &str = "do_not_verify";

/// Stored SHA-1 of an upload sent with `do_not_verify`
const UNVERIFIED_SHA1: &str = "none";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketIdRequest {
    bucket_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub bucket_id: String,
    pub upload_url: String,
    pub authorization_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFileNamesRequest {
    bucket_id: String,
    #[serde(default)]
    start_file_name: Option<String>,
    #[serde(default)]
    max_file_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesResponse {
    pub files: Vec<FileName>,
    pub next_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFileVersionsRequest {
    bucket_id: String,
    #[serde(default)]
    start_file_name: Option<String>,
    #[serde(default)]
    start_file_id: Option<String>,
    #[serde(default)]
    max_file_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileVersionsResponse {
    pub files: Vec<FileName>,
    pub next_file_name: Option<String>,
    pub next_file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileIdRequest {
    file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileVersionRequest {
    file_name: String,
    file_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFileVersion {
    pub file_id: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HideFileRequest {
    bucket_id: String,
    file_name: String,
}

/// POST /b2api/v1/b2_get_upload_url
pub async fn get_upload_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadUrlResponse>, EmulatorError> {
    state.check_token(&headers)?;
    let request: BucketIdRequest = parse_body(&body)?;

    if state.store.bucket(&request.bucket_id).is_none() {
        return Err(EmulatorError::bad_request(format!(
            "Invalid bucketId: {}",
            request.bucket_id
        )));
    }

    let upload_url = format!(
        "{}{}/b2_upload_file/{}",
        state.public_url(&headers),
        API_PREFIX,
        request.bucket_id
    );

    Ok(Json(UploadUrlResponse {
        authorization_token: state.issue_upload_token(&request.bucket_id),
        bucket_id: request.bucket_id,
        upload_url,
    }))
}

/// POST /b2api/v1/b2_upload_file/{bucket_id}
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(bucket_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FileInfo>, EmulatorError> {
    state.check_upload_token(&headers, &bucket_id)?;

    let encoded_name = required_header(&headers, "x-bz-file-name")?;
    let file_name = decode_file_name(encoded_name)
        .map_err(|e| EmulatorError::bad_request(e.to_string()))?;
    if file_name.is_empty() {
        return Err(EmulatorError::bad_request("File name must not be empty"));
    }

    if let Some(declared) = headers.get(header::CONTENT_LENGTH) {
        let declared: usize = declared
            .to_str()
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| EmulatorError::bad_request("Invalid Content-Length"))?;
        if declared != body.len() {
            return Err(EmulatorError::bad_request(format!(
                "Content-Length {} does not match {} bytes received",
                declared,
                body.len()
            )));
        }
    }

    let declared_sha1 = required_header(&headers, "x-bz-content-sha1")?;
    let content_sha1 = stored_sha1(declared_sha1, &body)?;

    // Stored as declared; `b2/x-auto` is resolved when the file is served
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(AUTO_CONTENT_TYPE)
        .to_string();

    let info = info_headers(&headers);
    debug!(%bucket_id, %file_name, size = body.len(), "upload received");

    let file = state.store.insert_upload(
        &bucket_id,
        NewUpload {
            file_name,
            content_type,
            content_sha1,
            info,
            content: body,
        },
    )?;
    info!(file_id = %file.file_id, file_name = %file.file_name, "file uploaded");

    Ok(Json(file))
}

/// POST /b2api/v1/b2_list_file_names
pub async fn list_file_names(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ListFileNamesResponse>, EmulatorError> {
    state.check_token(&headers)?;
    let request: ListFileNamesRequest = parse_body(&body)?;

    let max = page_size(request.max_file_count, state.config.default_page_size);
    let (files, next_file_name) = state.store.list_names(
        &request.bucket_id,
        request.start_file_name.as_deref(),
        max,
    )?;

    Ok(Json(ListFileNamesResponse {
        files,
        next_file_name,
    }))
}

/// POST /b2api/v1/b2_list_file_versions
pub async fn list_file_versions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ListFileVersionsResponse>, EmulatorError> {
    state.check_token(&headers)?;
    let request: ListFileVersionsRequest = parse_body(&body)?;

    if request.start_file_id.is_some() && request.start_file_name.is_none() {
        return Err(EmulatorError::bad_request(
            "startFileId requires startFileName",
        ));
    }

    let max = page_size(request.max_file_count, state.config.default_page_size);
    let (files, next) = state.store.list_versions(
        &request.bucket_id,
        request.start_file_name.as_deref(),
        request.start_file_id.as_deref(),
        max,
    )?;
    let (next_file_name, next_file_id) = next.unzip();

    Ok(Json(ListFileVersionsResponse {
        files,
        next_file_name,
        next_file_id,
    }))
}

/// POST /b2api/v1/b2_get_file_info
pub async fn get_file_info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FileInfo>, EmulatorError> {
    state.check_token(&headers)?;
    let request: FileIdRequest = parse_body(&body)?;

    let file = state.store.file(&request.file_id).ok_or_else(|| {
        EmulatorError::not_found(format!("File not present: {}", request.file_id))
    })?;

    Ok(Json(file.info))
}

/// POST /b2api/v1/b2_delete_file_version
pub async fn delete_file_version(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeletedFileVersion>, EmulatorError> {
    state.check_token(&headers)?;
    let request: FileVersionRequest = parse_body(&body)?;

    let removed = state
        .store
        .delete_version(&request.file_name, &request.file_id)?;
    info!(file_id = %removed.info.file_id, "file version deleted");

    Ok(Json(DeletedFileVersion {
        file_id: removed.info.file_id,
        file_name: removed.info.file_name,
    }))
}

/// POST /b2api/v1/b2_hide_file
pub async fn hide_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FileName>, EmulatorError> {
    state.check_token(&headers)?;
    let request: HideFileRequest = parse_body(&body)?;

    let marker = state.store.hide_file(&request.bucket_id, &request.file_name)?;
    info!(file_name = %marker.file_name, "file hidden");

    Ok(Json(marker))
}

/// Verify the declared SHA-1 against the body and return it verbatim
fn stored_sha1(declared: &str, body: &[u8]) -> Result<String, EmulatorError> {
    if declared == DO_NOT_VERIFY {
        return Ok(UNVERIFIED_SHA1.to_string());
    }
    if !declared.eq_ignore_ascii_case(&hex::encode(Sha1::digest(body))) {
        return Err(EmulatorError::bad_request("Sha1 did not match data received"));
    }
    Ok(declared.to_string())
}

fn required_header<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, EmulatorError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| EmulatorError::bad_request(format!("Missing header: {}", name)))
}

/// Collect `X-Bz-Info-*` headers, keyed by the lowercased suffix
fn info_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(INFO_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
