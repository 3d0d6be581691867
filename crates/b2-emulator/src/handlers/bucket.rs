//! Bucket operation handlers

use super::parse_body;
use crate::{AppState, EmulatorError};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use b2_client::{Bucket, BucketType};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketParams {
    pub account_id: String,
    pub bucket_name: String,
    pub bucket_type: BucketType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketRequest {
    account_id: String,
    bucket_id: String,
    #[serde(default)]
    bucket_type: Option<BucketType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRequest {
    account_id: String,
}

#[derive(Serialize)]
pub struct ListBucketsResponse {
    pub buckets: Vec<Bucket>,
}

/// Only the configured account exists
fn check_account(state: &AppState, account_id: &str) -> Result<(), EmulatorError> {
    if account_id == state.config.account_id {
        Ok(())
    } else {
        Err(EmulatorError::bad_request(format!("Invalid accountId: {}", account_id)))
    }
}

/// Only the types a caller may request
fn check_bucket_type(bucket_type: BucketType) -> Result<BucketType, EmulatorError> {
    if matches!(bucket_type, BucketType::AllPublic | BucketType::AllPrivate) {
        Ok(bucket_type)
    } else {
        Err(EmulatorError::bad_request(format!("Invalid bucketType: {}", bucket_type)))
    }
}

/// GET /b2api/v1/b2_create_bucket?accountId=..&bucketName=..&bucketType=..
pub async fn create_bucket(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<CreateBucketParams>, QueryRejection>,
) -> Result<Json<Bucket>, EmulatorError> {
    state.check_token(&headers)?;
    let Query(params) = params.map_err(|e| EmulatorError::bad_request(e.body_text()))?;
    check_account(&state, &params.account_id)?;
    let bucket_type = check_bucket_type(params.bucket_type)?;

    let bucket = state
        .store
        .create_bucket(&params.account_id, &params.bucket_name, bucket_type)?;
    info!(bucket_id = %bucket.bucket_id, bucket_name = %bucket.bucket_name, "bucket created");

    Ok(Json(bucket))
}

/// POST /b2api/v1/b2_delete_bucket
pub async fn delete_bucket(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Bucket>, EmulatorError> {
    state.check_token(&headers)?;
    let request: BucketRequest = parse_body(&body)?;
    check_account(&state, &request.account_id)?;

    let bucket = state.store.delete_bucket(&request.bucket_id)?;
    info!(bucket_id = %bucket.bucket_id, "bucket deleted");

    Ok(Json(bucket))
}

/// POST /b2api/v1/b2_update_bucket
pub async fn update_bucket(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Bucket>, EmulatorError> {
    state.check_token(&headers)?;
    let request: BucketRequest = parse_body(&body)?;
    check_account(&state, &request.account_id)?;

    let bucket_type = request
        .bucket_type
        .ok_or_else(|| EmulatorError::bad_request("bucketType is required"))?;
    let bucket = state
        .store
        .update_bucket(&request.bucket_id, check_bucket_type(bucket_type)?)?;

    Ok(Json(bucket))
}

/// POST /b2api/v1/b2_list_buckets
pub async fn list_buckets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ListBucketsResponse>, EmulatorError> {
    state.check_token(&headers)?;
    let request: AccountRequest = parse_body(&body)?;
    check_account(&state, &request.account_id)?;

    Ok(Json(ListBucketsResponse {
        buckets: state.store.list_buckets(),
    }))
}
