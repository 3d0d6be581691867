//! Resource types returned by the service

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Access policy of a bucket
///
/// Values this client does not know are kept verbatim in `Other`, so they
/// survive a round trip back to the service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BucketType {
    /// Anyone may download files
    AllPublic,
    /// Downloads require an authorization token
    AllPrivate,
    /// Bucket holding snapshots
    Snapshot,
    /// Any other type reported by the service
    Other(String),
}

impl BucketType {
    /// Wire name of this bucket type
    pub fn as_str(&self) -> &str {
        match self {
            Self::AllPublic => "allPublic",
            Self::AllPrivate => "allPrivate",
            Self::Snapshot => "snapshot",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for BucketType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "allPublic" => Self::AllPublic,
            "allPrivate" => Self::AllPrivate,
            "snapshot" => Self::Snapshot,
            _ => Self::Other(value),
        }
    }
}

impl From<BucketType> for String {
    fn from(value: BucketType) -> Self {
        match value {
            BucketType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Owning account
    pub account_id: String,
    /// Bucket id
    pub bucket_id: String,
    /// Bucket name
    pub bucket_name: String,
    /// Access policy
    pub bucket_type: BucketType,
}

/// What a file version represents
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileAction {
    /// Uploaded content
    Upload,
    /// A hide marker
    Hide,
    /// A large file that has been started but not finished
    Start,
    /// Any other action reported by the service, e.g. `folder`
    Other(String),
}

impl FileAction {
    /// Wire name of this action
    pub fn as_str(&self) -> &str {
        match self {
            Self::Upload => "upload",
            Self::Hide => "hide",
            Self::Start => "start",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for FileAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "upload" => Self::Upload,
            "hide" => Self::Hide,
            "start" => Self::Start,
            _ => Self::Other(value),
        }
    }
}

impl From<FileAction> for String {
    fn from(value: FileAction) -> Self {
        match value {
            FileAction::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One version of a file name, as returned by the listing calls
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileName {
    /// File id of this version
    pub file_id: String,
    /// File name
    pub file_name: String,
    /// Upload or hide marker
    pub action: FileAction,
    /// Size in bytes (zero for hide markers)
    #[serde(default)]
    pub size: u64,
    /// Upload time in milliseconds since the Unix epoch
    #[serde(default)]
    pub upload_timestamp: i64,
}

impl FileName {
    /// Upload time as a UTC timestamp
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.upload_timestamp).single()
    }
}

/// Full metadata of one file version
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    /// Owning account
    pub account_id: String,
    /// File id
    pub file_id: String,
    /// File name
    pub file_name: String,
    /// Bucket holding the file
    pub bucket_id: String,
    /// Size in bytes
    pub content_length: u64,
    /// SHA-1 declared at upload time
    pub content_sha1: String,
    /// MIME type
    pub content_type: String,
    /// User-supplied metadata
    #[serde(rename = "fileInfo")]
    pub info: HashMap<String, String>,
}
