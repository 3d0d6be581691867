//! Resource handles: values bound to the session that produced them
//!
//! A handle borrows its [`Session`]; it owns no connection and never
//! outlives the session. All network calls go through the session.

use crate::{
    listing::{FileNamesPage, FileVersionsPage, VersionCursor},
    types::*,
    upload::{UploadFile, UploadLease},
    ClientError, Result, Session,
};
use std::ops::Deref;
use tokio::io::{AsyncRead, AsyncWrite};

/// A file value with access to follow-up operations
#[derive(Clone, Debug)]
pub struct Handle<'s, T> {
    session: &'s Session,
    value: T,
}

impl<'s, T> Handle<'s, T> {
    /// The session this handle calls through
    pub fn session(&self) -> &'s Session {
        self.session
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl Handle<'_, FileInfo> {
    /// Download this file version
    pub async fn download<W>(&self, sink: &mut W) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.session.download_by_id(&self.value.file_id, sink).await
    }

    /// Delete this file version
    pub async fn delete(&self) -> Result<FileInfo> {
        self.session
            .delete_file_version(&self.value.file_name, &self.value.file_id)
            .await
    }

    /// Hide this file's name in its bucket
    ///
    /// Metadata rebuilt from a download carries no bucket id; such a value
    /// is rejected before any request is made.
    pub async fn hide(&self) -> Result<FileName> {
        if self.value.bucket_id.is_empty() {
            return Err(ClientError::Config(format!(
                "file {} has no bucket id; hide it through its bucket instead",
                self.value.file_name
            )));
        }
        self.session
            .hide_file(&self.value.bucket_id, &self.value.file_name)
            .await
    }
}

impl Handle<'_, FileName> {
    /// Fetch the full metadata of this version
    pub async fn get_file_info(&self) -> Result<FileInfo> {
        self.session.get_file_info(&self.value.file_id).await
    }

    /// Download this version
    pub async fn download<W>(&self, sink: &mut W) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.session.download_by_id(&self.value.file_id, sink).await
    }
}

/// A bucket with its own lazily acquired upload lease
#[derive(Debug)]
pub struct BucketHandle<'s> {
    session: &'s Session,
    bucket: Bucket,
    upload_lease: Option<UploadLease>,
}

impl<'s> BucketHandle<'s> {
    /// The session this handle calls through
    pub fn session(&self) -> &'s Session {
        self.session
    }

    /// Unwrap the bucket
    pub fn into_inner(self) -> Bucket {
        self.bucket
    }

    /// Use a lease obtained elsewhere for subsequent uploads
    pub fn with_upload_lease(mut self, lease: UploadLease) -> Result<Self> {
        if lease.bucket_id != self.bucket.bucket_id {
            return Err(ClientError::Config(format!(
                "upload lease for bucket {} cannot be used with bucket {}",
                lease.bucket_id, self.bucket.bucket_id
            )));
        }
        self.upload_lease = Some(lease);
        Ok(self)
    }

    /// The lease currently held by this handle
    pub fn upload_lease(&self) -> Option<&UploadLease> {
        self.upload_lease.as_ref()
    }

    /// Drop the held lease so the next upload requests a fresh one
    pub fn reset_upload_lease(&mut self) -> Option<UploadLease> {
        self.upload_lease.take()
    }

    /// Delete this bucket
    pub async fn delete(self) -> Result<Bucket> {
        self.session.delete_bucket(&self.bucket.bucket_id).await
    }

    /// Change the bucket type; every field is replaced from the response
    pub async fn update(&mut self, bucket_type: BucketType) -> Result<()> {
        let updated = self
            .session
            .update_bucket(&self.bucket.bucket_id, bucket_type)
            .await?;
        self.bucket = updated;
        Ok(())
    }

    /// List file names in this bucket
    pub async fn list_file_names(
        &self,
        start_file_name: Option<&str>,
        max_file_count: Option<u32>,
    ) -> Result<FileNamesPage> {
        self.session
            .list_file_names(&self.bucket.bucket_id, start_file_name, max_file_count)
            .await
    }

    /// List file versions in this bucket
    pub async fn list_file_versions(
        &self,
        start: Option<&VersionCursor>,
        max_file_count: Option<u32>,
    ) -> Result<FileVersionsPage> {
        self.session
            .list_file_versions(&self.bucket.bucket_id, start, max_file_count)
            .await
    }

    /// Hide a file name in this bucket
    pub async fn hide_file(&self, file_name: &str) -> Result<FileName> {
        self.session
            .hide_file(&self.bucket.bucket_id, file_name)
            .await
    }

    /// Download the latest version of a file in this bucket by name
    pub async fn download_file<W>(&self, file_name: &str, sink: &mut W) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.session
            .download_by_name(&self.bucket.bucket_name, file_name, sink)
            .await
    }

    /// Upload a file, requesting a lease on first use and reusing it after
    ///
    /// The lease is kept even when the upload fails or is cancelled; call
    /// [`reset_upload_lease`](Self::reset_upload_lease) after the service
    /// rejects it.
    pub async fn upload_file<R>(&mut self, reader: R, file: UploadFile) -> Result<FileInfo>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let lease = match &self.upload_lease {
            Some(lease) => lease.clone(),
            None => {
                let lease = self.session.lease_upload(&self.bucket.bucket_id).await?;
                self.upload_lease = Some(lease.clone());
                lease
            }
        };

        self.session.upload(Some(&lease), reader, file).await
    }
}

impl Deref for BucketHandle<'_> {
    type Target = Bucket;

    fn deref(&self) -> &Bucket {
        &self.bucket
    }
}

impl Session {
    /// Bind a bucket to this session
    pub fn bucket(&self, bucket: Bucket) -> BucketHandle<'_> {
        BucketHandle {
            session: self,
            bucket,
            upload_lease: None,
        }
    }

    /// Bind a file value to this session
    pub fn handle<T>(&self, value: T) -> Handle<'_, T> {
        Handle {
            session: self,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountAuthorization, Config};

    fn session() -> Session {
        let authorization = AccountAuthorization {
            account_id: "acct".into(),
            api_url: "http://127.0.0.1:1".into(),
            authorization_token: "token".into(),
            download_url: "http://127.0.0.1:1".into(),
        };
        Session::from_authorization(&Config::default(), authorization, "key").unwrap()
    }

    fn bucket(id: &str) -> Bucket {
        Bucket {
            account_id: "acct".into(),
            bucket_id: id.into(),
            bucket_name: "photos".into(),
            bucket_type: BucketType::AllPrivate,
        }
    }

    #[test]
    fn test_lease_for_other_bucket_is_rejected() {
        let session = session();
        let lease = UploadLease {
            bucket_id: "other".into(),
            upload_url: "http://127.0.0.1:1/upload".into(),
            authorization_token: "t".into(),
        };

        let err = session.bucket(bucket("bkt")).with_upload_lease(lease).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_hide_without_bucket_id_is_rejected_locally() {
        let session = session();
        let downloaded = FileInfo {
            file_id: "4_zfile".into(),
            file_name: "a.txt".into(),
            ..Default::default()
        };

        let err = session.handle(downloaded).hide().await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_cancelled_upload_keeps_lease() {
        let session = session();
        let lease = UploadLease {
            bucket_id: "bkt".into(),
            upload_url: "http://127.0.0.1:1/upload".into(),
            authorization_token: "t".into(),
        };
        let mut bucket = session.bucket(bucket("bkt")).with_upload_lease(lease).unwrap();

        {
            let file = UploadFile::new("a.txt", 5, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
            let upload = bucket.upload_file(std::io::Cursor::new(b"hello".to_vec()), file);
            futures::pin_mut!(upload);
            let _ = futures::poll!(upload.as_mut());
        }

        assert_eq!(bucket.upload_lease().unwrap().authorization_token, "t");
    }

    #[test]
    fn test_handle_derefs_to_value() {
        let session = session();
        let handle = session.bucket(bucket("bkt"));
        assert_eq!(handle.bucket_name, "photos");
        assert!(handle.upload_lease().is_none());
        assert_eq!(handle.into_inner().bucket_id, "bkt");
    }
}
