//! Request/response envelope shared by every operation
//!
//! A response with status 200 is decoded into the caller's type; anything
//! else is decoded as an [`ApiError`] body. Failures of the exchange itself
//! stay [`ClientError::Transport`], so callers can tell a rejected request
//! apart from one that never completed.

use crate::{ApiError, ClientError, Config, Result};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// The one status the service uses for success
pub const GOOD_STATUS: StatusCode = StatusCode::OK;

/// Thin wrapper over the HTTP client
#[derive(Clone, Debug)]
pub struct Transport {
    http: Client,
}

impl Transport {
    /// Build the HTTP client from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ClientError::Config(format!("invalid user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http })
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Send a request and decode the JSON success payload
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(ClientError::from)
    }

    /// Send a request and return the raw response if the status is 200
    ///
    /// The body of a successful response is left unread so callers can
    /// stream it.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        debug!("Sending {} request to {}", request.method(), redact_query(request.url()));

        let response = self.http.execute(request).await?;
        check_status(response).await
    }
}

/// Pass a 200 response through, turn anything else into an API error
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == GOOD_STATUS {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let err = decode_api_error(status, &body)?;
    warn!(code = %err.code, status = err.status, "B2 API error: {}", err.message);
    Err(ClientError::Api(err))
}

/// Decode an error body; a body that is not an error object is a decode failure
pub fn decode_api_error(status: StatusCode, body: &[u8]) -> Result<ApiError> {
    serde_json::from_slice::<ApiError>(body).map_err(|e| {
        ClientError::Decode(format!(
            "HTTP {} with unreadable error body ({}): {}",
            status.as_u16(),
            e,
            String::from_utf8_lossy(body)
        ))
    })
}

fn redact_query(url: &reqwest::Url) -> &str {
    match url.as_str().split_once('?') {
        Some((path, _)) => path,
        None => url.as_str(),
    }
}
