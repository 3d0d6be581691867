//! In-memory buckets and file versions

use crate::error::{B2ErrorCode, EmulatorError};
use b2_client::{Bucket, BucketType, FileAction, FileInfo, FileName};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Hard cap on the page size of listing calls
pub const MAX_PAGE_SIZE: usize = 1000;

/// One stored version of a file name
#[derive(Clone, Debug)]
pub struct FileVersion {
    /// Metadata as returned by the API
    pub info: FileInfo,
    /// Upload or hide marker
    pub action: FileAction,
    /// Upload time in epoch milliseconds
    pub upload_timestamp: i64,
    /// File content; empty for hide markers
    pub content: Bytes,
    seq: u64,
}

impl FileVersion {
    /// Listing entry for this version
    pub fn summary(&self) -> FileName {
        FileName {
            file_id: self.info.file_id.clone(),
            file_name: self.info.file_name.clone(),
            action: self.action.clone(),
            size: self.info.content_length,
            upload_timestamp: self.upload_timestamp,
        }
    }
}

/// Content and metadata of a new upload
#[derive(Debug)]
pub struct NewUpload {
    pub file_name: String,
    pub content_type: String,
    pub content_sha1: String,
    pub info: HashMap<String, String>,
    pub content: Bytes,
}

#[derive(Default)]
struct Inner {
    buckets: BTreeMap<String, Bucket>,
    versions: HashMap<String, Vec<FileVersion>>,
    next_seq: u64,
}

impl Inner {
    fn require_bucket(&self, bucket_id: &str) -> Result<&Bucket, EmulatorError> {
        self.buckets
            .get(bucket_id)
            .ok_or_else(|| EmulatorError::bad_request(format!("Invalid bucketId: {}", bucket_id)))
    }

    /// Versions of a bucket by name, newest first within a name
    fn sorted_versions(&self, bucket_id: &str) -> Vec<&FileVersion> {
        let mut versions: Vec<&FileVersion> = self
            .versions
            .get(bucket_id)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        versions.sort_by(|a, b| {
            a.info
                .file_name
                .cmp(&b.info.file_name)
                .then(b.seq.cmp(&a.seq))
        });
        versions
    }

    fn push_version(&mut self, bucket_id: &str, mut version: FileVersion) -> FileVersion {
        self.next_seq += 1;
        version.seq = self.next_seq;
        self.versions
            .entry(bucket_id.to_string())
            .or_default()
            .push(version.clone());
        version
    }
}

/// Thread-safe store shared by all handlers
#[derive(Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Buckets ====================

    pub fn create_bucket(
        &self,
        account_id: &str,
        bucket_name: &str,
        bucket_type: BucketType,
    ) -> Result<Bucket, EmulatorError> {
        if bucket_name.len() < 6 || bucket_name.len() > 50 {
            return Err(EmulatorError::bad_request("bucketName must be 6 to 50 characters"));
        }
        if !bucket_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(EmulatorError::bad_request(format!("Invalid bucketName: {}", bucket_name)));
        }

        let mut inner = self.inner.write();
        if inner.buckets.values().any(|b| b.bucket_name == bucket_name) {
            return Err(EmulatorError::b2(
                B2ErrorCode::DuplicateBucketName,
                format!("Bucket name is already in use: {}", bucket_name),
            ));
        }

        let bucket = Bucket {
            account_id: account_id.to_string(),
            bucket_id: Uuid::new_v4().simple().to_string()[..24].to_string(),
            bucket_name: bucket_name.to_string(),
            bucket_type,
        };
        inner.buckets.insert(bucket.bucket_id.clone(), bucket.clone());
        Ok(bucket)
    }

    pub fn delete_bucket(&self, bucket_id: &str) -> Result<Bucket, EmulatorError> {
        let mut inner = self.inner.write();
        inner.require_bucket(bucket_id)?;

        if inner.versions.get(bucket_id).is_some_and(|v| !v.is_empty()) {
            return Err(EmulatorError::b2(
                B2ErrorCode::CannotDeleteNonEmptyBucket,
                format!("Cannot delete non-empty bucket: {}", bucket_id),
            ));
        }

        inner.versions.remove(bucket_id);
        inner
            .buckets
            .remove(bucket_id)
            .ok_or_else(|| EmulatorError::Internal("bucket vanished during delete".to_string()))
    }

    pub fn update_bucket(&self, bucket_id: &str, bucket_type: BucketType) -> Result<Bucket, EmulatorError> {
        let mut inner = self.inner.write();
        let bucket = inner
            .buckets
            .get_mut(bucket_id)
            .ok_or_else(|| EmulatorError::bad_request(format!("Invalid bucketId: {}", bucket_id)))?;
        bucket.bucket_type = bucket_type;
        Ok(bucket.clone())
    }

    /// All buckets in bucket id order
    pub fn list_buckets(&self) -> Vec<Bucket> {
        self.inner.read().buckets.values().cloned().collect()
    }

    pub fn bucket(&self, bucket_id: &str) -> Option<Bucket> {
        self.inner.read().buckets.get(bucket_id).cloned()
    }

    pub fn bucket_by_name(&self, bucket_name: &str) -> Option<Bucket> {
        self.inner
            .read()
            .buckets
            .values()
            .find(|b| b.bucket_name == bucket_name)
            .cloned()
    }

    // ==================== Files ====================

    pub fn insert_upload(&self, bucket_id: &str, upload: NewUpload) -> Result<FileInfo, EmulatorError> {
        let mut inner = self.inner.write();
        let account_id = inner.require_bucket(bucket_id)?.account_id.clone();

        let version = FileVersion {
            info: FileInfo {
                account_id,
                file_id: new_file_id(),
                file_name: upload.file_name,
                bucket_id: bucket_id.to_string(),
                content_length: upload.content.len() as u64,
                content_sha1: upload.content_sha1,
                content_type: upload.content_type,
                info: upload.info,
            },
            action: FileAction::Upload,
            upload_timestamp: chrono::Utc::now().timestamp_millis(),
            content: upload.content,
            seq: 0,
        };

        Ok(inner.push_version(bucket_id, version).info)
    }

    pub fn hide_file(&self, bucket_id: &str, file_name: &str) -> Result<FileName, EmulatorError> {
        let mut inner = self.inner.write();
        let account_id = inner.require_bucket(bucket_id)?.account_id.clone();

        let exists = inner
            .versions
            .get(bucket_id)
            .is_some_and(|v| v.iter().any(|f| f.info.file_name == file_name));
        if !exists {
            return Err(EmulatorError::bad_request(format!("File not present: {}", file_name)));
        }

        let marker = FileVersion {
            info: FileInfo {
                account_id,
                file_id: new_file_id(),
                file_name: file_name.to_string(),
                bucket_id: bucket_id.to_string(),
                content_type: "application/x-bz-hide-marker".to_string(),
                ..Default::default()
            },
            action: FileAction::Hide,
            upload_timestamp: chrono::Utc::now().timestamp_millis(),
            content: Bytes::new(),
            seq: 0,
        };

        Ok(inner.push_version(bucket_id, marker).summary())
    }

    pub fn file(&self, file_id: &str) -> Option<FileVersion> {
        self.inner
            .read()
            .versions
            .values()
            .flatten()
            .find(|f| f.info.file_id == file_id)
            .cloned()
    }

    /// Newest version of a name, unless that version is a hide marker
    pub fn latest_visible(&self, bucket_id: &str, file_name: &str) -> Option<FileVersion> {
        let inner = self.inner.read();
        inner
            .versions
            .get(bucket_id)?
            .iter()
            .filter(|f| f.info.file_name == file_name)
            .max_by_key(|f| f.seq)
            .filter(|f| f.action == FileAction::Upload)
            .cloned()
    }

    pub fn delete_version(&self, file_name: &str, file_id: &str) -> Result<FileVersion, EmulatorError> {
        let mut inner = self.inner.write();
        for versions in inner.versions.values_mut() {
            if let Some(pos) = versions
                .iter()
                .position(|f| f.info.file_id == file_id && f.info.file_name == file_name)
            {
                return Ok(versions.remove(pos));
            }
        }
        Err(EmulatorError::bad_request(format!(
            "File not present: {} {}",
            file_name, file_id
        )))
    }

    // ==================== Listing ====================

    /// Latest visible version of each name starting at `start`, plus the next start name
    pub fn list_names(
        &self,
        bucket_id: &str,
        start: Option<&str>,
        max: usize,
    ) -> Result<(Vec<FileName>, Option<String>), EmulatorError> {
        let inner = self.inner.read();
        inner.require_bucket(bucket_id)?;

        let mut latest: Vec<&FileVersion> = Vec::new();
        for version in inner.sorted_versions(bucket_id) {
            if latest.last().is_some_and(|l| l.info.file_name == version.info.file_name) {
                continue;
            }
            latest.push(version);
        }

        let mut visible = latest
            .into_iter()
            .filter(|f| f.action != FileAction::Hide)
            .filter(|f| start.map_or(true, |s| f.info.file_name.as_str() >= s));

        let files: Vec<FileName> = visible.by_ref().take(max).map(FileVersion::summary).collect();
        let next = visible.next().map(|f| f.info.file_name.clone());
        Ok((files, next))
    }

    /// Every version starting at (`start_name`, `start_id`), plus the next start position
    pub fn list_versions(
        &self,
        bucket_id: &str,
        start_name: Option<&str>,
        start_id: Option<&str>,
        max: usize,
    ) -> Result<(Vec<FileName>, Option<(String, String)>), EmulatorError> {
        let inner = self.inner.read();
        inner.require_bucket(bucket_id)?;

        let sorted = inner.sorted_versions(bucket_id);
        let begin = match (start_name, start_id) {
            (Some(name), Some(id)) => sorted
                .iter()
                .position(|f| f.info.file_name == name && f.info.file_id == id)
                .or_else(|| sorted.iter().position(|f| f.info.file_name.as_str() > name)),
            (Some(name), None) => sorted.iter().position(|f| f.info.file_name.as_str() >= name),
            (None, _) => Some(0),
        }
        .unwrap_or(sorted.len());

        let page = &sorted[begin..];
        let files = page.iter().take(max).map(|f| f.summary()).collect();
        let next = page
            .get(max)
            .map(|f| (f.info.file_name.clone(), f.info.file_id.clone()));
        Ok((files, next))
    }
}

fn new_file_id() -> String {
    format!("4_z{}", Uuid::new_v4().simple())
}

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`
pub fn page_size(requested: Option<usize>, default: usize) -> usize {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(default)
        .clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(store: &Store, bucket_id: &str, name: &str) -> FileInfo {
        store
            .insert_upload(
                bucket_id,
                NewUpload {
                    file_name: name.to_string(),
                    content_type: "text/plain".to_string(),
                    content_sha1: "sha".to_string(),
                    info: HashMap::new(),
                    content: Bytes::from_static(b"hello"),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_duplicate_bucket_name() {
        let store = Store::new();
        store.create_bucket("acct", "photos-1", BucketType::AllPrivate).unwrap();
        let err = store
            .create_bucket("acct", "photos-1", BucketType::AllPublic)
            .unwrap_err();
        assert_eq!(err.error_code(), B2ErrorCode::DuplicateBucketName);
    }

    #[test]
    fn test_non_empty_bucket_cannot_be_deleted() {
        let store = Store::new();
        let bucket = store.create_bucket("acct", "photos-1", BucketType::AllPrivate).unwrap();
        let file = upload(&store, &bucket.bucket_id, "a.txt");

        let err = store.delete_bucket(&bucket.bucket_id).unwrap_err();
        assert_eq!(err.error_code(), B2ErrorCode::CannotDeleteNonEmptyBucket);

        store.delete_version("a.txt", &file.file_id).unwrap();
        store.delete_bucket(&bucket.bucket_id).unwrap();
        assert!(store.list_buckets().is_empty());
    }

    #[test]
    fn test_hidden_names_leave_name_listing() {
        let store = Store::new();
        let bucket = store.create_bucket("acct", "photos-1", BucketType::AllPrivate).unwrap();
        upload(&store, &bucket.bucket_id, "a.txt");
        upload(&store, &bucket.bucket_id, "b.txt");
        store.hide_file(&bucket.bucket_id, "a.txt").unwrap();

        let (names, next) = store.list_names(&bucket.bucket_id, None, 10).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].file_name, "b.txt");
        assert!(next.is_none());
        assert!(store.latest_visible(&bucket.bucket_id, "a.txt").is_none());

        let (versions, _) = store.list_versions(&bucket.bucket_id, None, None, 10).unwrap();
        let actions: Vec<_> = versions.iter().map(|v| (v.file_name.as_str(), v.action.clone())).collect();
        assert_eq!(
            actions,
            [
                ("a.txt", FileAction::Hide),
                ("a.txt", FileAction::Upload),
                ("b.txt", FileAction::Upload),
            ]
        );
    }

    #[test]
    fn test_version_cursor_is_inclusive() {
        let store = Store::new();
        let bucket = store.create_bucket("acct", "photos-1", BucketType::AllPrivate).unwrap();
        upload(&store, &bucket.bucket_id, "a.txt");
        upload(&store, &bucket.bucket_id, "a.txt");
        upload(&store, &bucket.bucket_id, "b.txt");

        let (first, next) = store.list_versions(&bucket.bucket_id, None, None, 1).unwrap();
        let (name, id) = next.unwrap();
        let (second, _) = store
            .list_versions(&bucket.bucket_id, Some(&name), Some(&id), 1)
            .unwrap();

        assert_eq!(first[0].file_name, "a.txt");
        assert_eq!(second[0].file_id, id);
        assert_ne!(first[0].file_id, second[0].file_id);
    }

    #[test]
    fn test_page_size() {
        assert_eq!(page_size(None, 100), 100);
        assert_eq!(page_size(Some(0), 100), 100);
        assert_eq!(page_size(Some(5000), 100), MAX_PAGE_SIZE);
    }
}
