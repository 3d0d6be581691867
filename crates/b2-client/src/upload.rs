//! Upload leases and single-request file uploads

use crate::{
    encoding::{
        encode_file_name, AUTO_CONTENT_TYPE, INFO_HEADER_PREFIX, LAST_MODIFIED_INFO_KEY,
    },
    types::FileInfo,
    ClientError, Result, Session,
};
use chrono::{DateTime, Utc};
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Body,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

/// Upload URL and token for one bucket
///
/// A lease can be reused for any number of uploads into its bucket until
/// the service rejects it; a fresh one must then be requested with
/// [`Session::lease_upload`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLease {
    /// Bucket this lease may upload into
    pub bucket_id: String,
    /// URL the file content is posted to
    pub upload_url: String,
    /// Token for the upload URL, distinct from the session token
    pub authorization_token: String,
}

impl fmt::Debug for UploadLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadLease")
            .field("bucket_id", &self.bucket_id)
            .field("upload_url", &self.upload_url)
            .field("authorization_token", &"<redacted>")
            .finish()
    }
}

/// Description of a file to upload
#[derive(Clone, Debug, Default)]
pub struct UploadFile {
    /// Name of the file, not yet encoded
    pub file_name: String,
    /// Exact number of bytes the reader yields
    pub file_size: u64,
    /// MIME type; empty lets the service detect it
    pub content_type: String,
    /// Hex SHA-1 of the content, checked by the service
    pub sha1: String,
    /// Last modification time of the source
    pub modified: Option<DateTime<Utc>>,
    /// Custom file info, one header per entry
    pub info: BTreeMap<String, String>,
}

impl UploadFile {
    /// Describe a file by name, size and SHA-1
    pub fn new(file_name: impl Into<String>, file_size: u64, sha1: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            sha1: sha1.into(),
            ..Default::default()
        }
    }

    /// Set content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the source modification time
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Add a custom file info entry
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    /// Headers describing this file for the given lease
    pub(crate) fn headers(&self, lease: &UploadLease) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, header_value(&lease.authorization_token)?);
        headers.insert(
            HeaderName::from_static("x-bz-file-name"),
            header_value(&encode_file_name(&self.file_name))?,
        );

        let content_type = if self.content_type.is_empty() {
            AUTO_CONTENT_TYPE
        } else {
            self.content_type.as_str()
        };
        headers.insert(header::CONTENT_TYPE, header_value(content_type)?);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.file_size));
        headers.insert(HeaderName::from_static("x-bz-content-sha1"), header_value(&self.sha1)?);

        if let Some(modified) = self.modified {
            headers.insert(
                info_header_name(LAST_MODIFIED_INFO_KEY)?,
                HeaderValue::from(modified.timestamp_millis()),
            );
        }

        for (key, value) in &self.info {
            headers.insert(info_header_name(key)?, header_value(value)?);
        }

        Ok(headers)
    }
}

fn info_header_name(key: &str) -> Result<HeaderName> {
    let name = format!("{}{}", INFO_HEADER_PREFIX, key);
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::Config(format!("file info key '{}' is not a valid header name", key)))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ClientError::Config(format!("'{}' is not a valid header value", value)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlRequest<'a> {
    bucket_id: &'a str,
}

impl Session {
    /// Request an upload lease for a bucket
    ///
    /// Always issues a new request; the session cache is left untouched.
    #[instrument(skip(self))]
    pub async fn lease_upload(&self, bucket_id: &str) -> Result<UploadLease> {
        self.post_json("b2_get_upload_url", &UploadUrlRequest { bucket_id })
            .await
    }

    /// Upload one file, streaming its content from `reader`
    ///
    /// Uses `lease` when given, the cached lease otherwise. The lease stays
    /// valid for further uploads; nothing is renewed when the service
    /// rejects it.
    #[instrument(skip(self, lease, reader, file), fields(file_name = %file.file_name, size = file.file_size))]
    pub async fn upload<R>(
        &self,
        lease: Option<&UploadLease>,
        reader: R,
        file: UploadFile,
    ) -> Result<FileInfo>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let lease = lease.or(self.upload_lease.as_ref()).ok_or_else(|| {
            ClientError::Config("no upload lease given and none cached".to_string())
        })?;

        let headers = file.headers(lease)?;
        debug!(bucket_id = %lease.bucket_id, "Uploading {} to {}", file.file_name, lease.upload_url);

        let request = self
            .transport
            .http()
            .post(&lease.upload_url)
            .headers(headers)
            .body(Body::wrap_stream(ReaderStream::new(reader)));

        self.transport.execute(request).await
    }
}
