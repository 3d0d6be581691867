//! Account authorization handler

use crate::{AppState, EmulatorError};
use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeAccountResponse {
    pub account_id: String,
    pub api_url: String,
    pub authorization_token: String,
    pub download_url: String,
}

/// GET /b2api/v1/b2_authorize_account
pub async fn authorize_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuthorizeAccountResponse>, EmulatorError> {
    state.check_basic_auth(&headers)?;

    let base = state.public_url(&headers);
    info!(account_id = %state.config.account_id, "account authorized");

    Ok(Json(AuthorizeAccountResponse {
        account_id: state.config.account_id.clone(),
        api_url: base.clone(),
        authorization_token: state.issue_token(),
        download_url: base,
    }))
}
