//! Client configuration

use crate::{ClientError, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default authorization endpoint
pub const DEFAULT_AUTH_URL: &str = "https://api.backblazeb2.com";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL used for `b2_authorize_account`
    pub auth_url: String,
    /// Deadline for a whole request, body included; unset by default so
    /// long uploads and downloads are never cut off
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout: None,
            user_agent: format!("b2-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config authorizing against the given endpoint
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            ..Default::default()
        }
    }

    /// Set a deadline covering the whole request, body included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Authorization base URL without a trailing slash
    pub fn base_url(&self) -> Result<String> {
        let url = Url::parse(&self.auth_url)
            .map_err(|e| ClientError::Config(format!("invalid auth url '{}': {}", self.auth_url, e)))?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

/// Account id and application key pair
#[derive(Clone)]
pub struct Credentials {
    /// Account id (or application key id)
    pub account_id: String,
    /// Application key
    pub application_key: String,
}

impl Credentials {
    /// Create credentials from their parts
    pub fn new(account_id: impl Into<String>, application_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            application_key: application_key.into(),
        }
    }

    /// Read `B2_ACCOUNT_ID` and `B2_APPLICATION_KEY`, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let account_id = dotenvy::var("B2_ACCOUNT_ID")
            .map_err(|_| ClientError::Config("B2_ACCOUNT_ID is not set".to_string()))?;
        let application_key = dotenvy::var("B2_APPLICATION_KEY")
            .map_err(|_| ClientError::Config("B2_APPLICATION_KEY is not set".to_string()))?;

        Ok(Self::new(account_id, application_key))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("application_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let config = Config::new("http://127.0.0.1:8080/");
        assert_eq!(config.base_url().unwrap(), "http://127.0.0.1:8080");

        let config = Config::default();
        assert_eq!(config.base_url().unwrap(), DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_no_request_deadline_by_default() {
        assert!(Config::default().timeout.is_none());

        let config = Config::new("http://127.0.0.1:8080").with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_auth_url() {
        let err = Config::new("not a url").base_url().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials::new("acct", "super-secret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("acct"));
        assert!(!printed.contains("super-secret"));
    }
}
