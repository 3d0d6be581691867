//! Authenticated session and the bucket / file metadata operations

use crate::{
    encoding::API_PREFIX,
    transport::Transport,
    types::*,
    upload::UploadLease,
    Config, Credentials, Result,
};
use reqwest::{header, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

/// Identity returned by `b2_authorize_account`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAuthorization {
    /// Account id
    pub account_id: String,
    /// Base URL for every API call except downloads
    pub api_url: String,
    /// Token sent in the `Authorization` header
    pub authorization_token: String,
    /// Base URL for downloads
    pub download_url: String,
}

impl fmt::Debug for AccountAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountAuthorization")
            .field("account_id", &self.account_id)
            .field("api_url", &self.api_url)
            .field("authorization_token", &"<redacted>")
            .field("download_url", &self.download_url)
            .finish()
    }
}

/// An authenticated connection to the service
///
/// The token and base URLs never change for the lifetime of a session. When
/// the token expires every call fails with an API error and a new session
/// has to be created with [`Session::authenticate`].
pub struct Session {
    pub(crate) transport: Transport,
    pub(crate) authorization: AccountAuthorization,
    application_key: String,
    pub(crate) upload_lease: Option<UploadLease>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRequest<'a> {
    account_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketRequest<'a> {
    account_id: &'a str,
    bucket_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket_type: Option<&'a str>,
}

#[derive(Deserialize)]
struct ListBucketsResponse {
    buckets: Vec<Bucket>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileIdRequest<'a> {
    file_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFileVersionRequest<'a> {
    file_name: &'a str,
    file_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HideFileRequest<'a> {
    bucket_id: &'a str,
    file_name: &'a str,
}

impl Session {
    /// Exchange an account id and application key for a session
    #[instrument(skip(config, application_key))]
    pub async fn authenticate(
        config: &Config,
        account_id: &str,
        application_key: &str,
    ) -> Result<Self> {
        let transport = Transport::new(config)?;
        let url = format!("{}{}/b2_authorize_account", config.base_url()?, API_PREFIX);

        let request = transport
            .http()
            .get(&url)
            .basic_auth(account_id, Some(application_key));
        let authorization: AccountAuthorization = transport.execute(request).await?;

        info!(account_id = %authorization.account_id, api_url = %authorization.api_url, "Authorized B2 account");

        Ok(Self {
            transport,
            authorization,
            application_key: application_key.to_string(),
            upload_lease: None,
        })
    }

    /// Authenticate with a credential pair
    pub async fn authenticate_with(config: &Config, credentials: &Credentials) -> Result<Self> {
        Self::authenticate(config, &credentials.account_id, &credentials.application_key).await
    }

    /// Build a session from an authorization obtained earlier
    pub fn from_authorization(
        config: &Config,
        authorization: AccountAuthorization,
        application_key: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            authorization,
            application_key: application_key.into(),
            upload_lease: None,
        })
    }

    /// Account id
    pub fn account_id(&self) -> &str {
        &self.authorization.account_id
    }

    /// Base URL for API calls
    pub fn api_url(&self) -> &str {
        &self.authorization.api_url
    }

    /// Base URL for downloads
    pub fn download_url(&self) -> &str {
        &self.authorization.download_url
    }

    /// The authorization this session was created from
    pub fn authorization(&self) -> &AccountAuthorization {
        &self.authorization
    }

    // ==================== Bucket Operations ====================

    /// Create a bucket
    ///
    /// Unlike every other mutating call the arguments travel as query
    /// parameters.
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, bucket_name: &str, bucket_type: BucketType) -> Result<Bucket> {
        let request = self
            .authorized(self.transport.http().get(self.api_endpoint("b2_create_bucket")))
            .query(&[
                ("accountId", self.account_id()),
                ("bucketName", bucket_name),
                ("bucketType", bucket_type.as_str()),
            ]);

        self.transport.execute(request).await
    }

    /// Delete a bucket, returning its last known state
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<Bucket> {
        let body = BucketRequest {
            account_id: self.account_id(),
            bucket_id,
            bucket_type: None,
        };
        self.post_json("b2_delete_bucket", &body).await
    }

    /// Change the type of a bucket
    #[instrument(skip(self))]
    pub async fn update_bucket(&self, bucket_id: &str, bucket_type: BucketType) -> Result<Bucket> {
        let body = BucketRequest {
            account_id: self.account_id(),
            bucket_id,
            bucket_type: Some(bucket_type.as_str()),
        };
        self.post_json("b2_update_bucket", &body).await
    }

    /// List all buckets of the account, in the order the service returns them
    #[instrument(skip(self))]
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let body = AccountRequest {
            account_id: self.account_id(),
        };
        let response: ListBucketsResponse = self.post_json("b2_list_buckets", &body).await?;
        Ok(response.buckets)
    }

    // ==================== File Operations ====================

    /// Get the metadata of one file version
    #[instrument(skip(self))]
    pub async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        self.post_json("b2_get_file_info", &FileIdRequest { file_id }).await
    }

    /// Delete one version of a file
    #[instrument(skip(self))]
    pub async fn delete_file_version(&self, file_name: &str, file_id: &str) -> Result<FileInfo> {
        let body = DeleteFileVersionRequest { file_name, file_id };
        self.post_json("b2_delete_file_version", &body).await
    }

    /// Hide a file name; earlier versions stay stored
    #[instrument(skip(self))]
    pub async fn hide_file(&self, bucket_id: &str, file_name: &str) -> Result<FileName> {
        let body = HideFileRequest { bucket_id, file_name };
        self.post_json("b2_hide_file", &body).await
    }

    // ==================== Upload Lease Cache ====================

    /// Store a lease for uploads that do not pass one explicitly
    ///
    /// Returns the lease it replaces.
    pub fn cache_upload_lease(&mut self, lease: UploadLease) -> Option<UploadLease> {
        self.upload_lease.replace(lease)
    }

    /// The cached lease, if any
    pub fn cached_upload_lease(&self) -> Option<&UploadLease> {
        self.upload_lease.as_ref()
    }

    /// Remove and return the cached lease
    pub fn take_upload_lease(&mut self) -> Option<UploadLease> {
        self.upload_lease.take()
    }

    // ==================== Helper Methods ====================

    pub(crate) fn api_endpoint(&self, operation: &str) -> String {
        format!(
            "{}{}/{}",
            self.authorization.api_url.trim_end_matches('/'),
            API_PREFIX,
            operation
        )
    }

    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::AUTHORIZATION, &self.authorization.authorization_token)
    }

    pub(crate) async fn post_json<B, T>(&self, operation: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .authorized(self.transport.http().post(self.api_endpoint(operation)))
            .json(body);
        self.transport.execute(request).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authorization", &self.authorization)
            .field("application_key", &(!self.application_key.is_empty()).then_some("<redacted>"))
            .field("upload_lease", &self.upload_lease)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let authorization = AccountAuthorization {
            account_id: "acct".into(),
            api_url: "https://api001.example.com/".into(),
            authorization_token: "secret-token".into(),
            download_url: "https://f001.example.com".into(),
        };
        Session::from_authorization(&Config::default(), authorization, "app-key").unwrap()
    }

    #[test]
    fn test_api_endpoint() {
        assert_eq!(
            session().api_endpoint("b2_list_buckets"),
            "https://api001.example.com/b2api/v1/b2_list_buckets"
        );
    }

    #[test]
    fn test_bucket_request_omits_type() {
        let body = BucketRequest {
            account_id: "acct",
            bucket_id: "bkt",
            bucket_type: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"accountId": "acct", "bucketId": "bkt"})
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let printed = format!("{:?}", session());
        assert!(!printed.contains("secret-token"));
        assert!(!printed.contains("app-key"));
        assert!(printed.contains("acct"));
    }

    #[test]
    fn test_authorization_serializes_without_app_key() {
        let json = serde_json::to_string(session().authorization()).unwrap();
        assert!(json.contains("\"authorizationToken\":\"secret-token\""));
        assert!(!json.contains("app-key"));
    }
}
