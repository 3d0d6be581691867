//! Application state

use crate::config::EmulatorConfig;
use crate::error::{B2ErrorCode, EmulatorError};
use crate::store::Store;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use dashmap::{DashMap, DashSet};
use tracing::debug;
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    /// Emulator configuration
    pub config: EmulatorConfig,
    /// Buckets and file versions
    pub store: Store,
    /// Account authorization tokens handed out so far
    ///
    /// Tokens never expire and neither set is pruned; both grow for the
    /// lifetime of the process.
    tokens: DashSet<String>,
    /// Upload authorization tokens, mapped to the bucket they were issued for
    upload_tokens: DashMap<String, String>,
}

impl AppState {
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            store: Store::new(),
            tokens: DashSet::new(),
            upload_tokens: DashMap::new(),
        }
    }

    /// Check `Authorization: Basic ...` against the configured account
    pub fn check_basic_auth(&self, headers: &HeaderMap) -> Result<(), EmulatorError> {
        let unauthorized = || EmulatorError::b2(B2ErrorCode::Unauthorized, "Invalid account id or application key");

        let value = authorization(headers).ok_or_else(unauthorized)?;
        let encoded = value.strip_prefix("Basic ").ok_or_else(unauthorized)?;
        let decoded = STANDARD.decode(encoded.trim()).map_err(|_| unauthorized())?;
        let decoded = String::from_utf8(decoded).map_err(|_| unauthorized())?;
        let (account_id, key) = decoded.split_once(':').ok_or_else(unauthorized)?;

        if account_id == self.config.account_id && key == self.config.application_key {
            Ok(())
        } else {
            debug!(account_id, "rejected credentials");
            Err(unauthorized())
        }
    }

    /// Issue a fresh account authorization token
    pub fn issue_token(&self) -> String {
        let token = format!("4_{}", Uuid::new_v4().simple());
        self.tokens.insert(token.clone());
        token
    }

    /// Require a valid account authorization token
    pub fn check_token(&self, headers: &HeaderMap) -> Result<(), EmulatorError> {
        match authorization(headers) {
            Some(token) if self.tokens.contains(token) => Ok(()),
            Some(_) => Err(EmulatorError::b2(
                B2ErrorCode::BadAuthToken,
                "Invalid authorization token",
            )),
            None => Err(EmulatorError::b2(
                B2ErrorCode::BadAuthToken,
                "Authorization header is missing",
            )),
        }
    }

    /// Issue an upload token bound to one bucket
    pub fn issue_upload_token(&self, bucket_id: &str) -> String {
        let token = format!("upload_{}", Uuid::new_v4().simple());
        self.upload_tokens.insert(token.clone(), bucket_id.to_string());
        token
    }

    /// Require an upload token issued for `bucket_id`
    pub fn check_upload_token(&self, headers: &HeaderMap, bucket_id: &str) -> Result<(), EmulatorError> {
        let valid = authorization(headers)
            .and_then(|token| self.upload_tokens.get(token))
            .is_some_and(|issued_for| issued_for.value() == bucket_id);

        if valid {
            Ok(())
        } else {
            Err(EmulatorError::b2(
                B2ErrorCode::BadAuthToken,
                "Invalid upload authorization token",
            ))
        }
    }

    /// Base URL advertised to clients
    pub fn public_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.public_url {
            return url.trim_end_matches('/').to_string();
        }
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.bind_addr());
        format!("http://{}", host)
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}
