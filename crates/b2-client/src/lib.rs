//! # B2 Client
//!
//! An async client for the Backblaze B2 storage API.
//!
//! ## Features
//!
//! - **Sessions**: one credential exchange yields the token and base URLs
//!   used by every later call
//! - **Upload leases**: bucket-scoped upload URLs, reusable until rejected
//! - **Streaming**: uploads read from any `AsyncRead`, downloads write to any
//!   `AsyncWrite` without buffering the payload
//! - **Exact pagination**: listing cursors are replayed verbatim
//!
//! ## Example
//!
//! ```rust,ignore
//! use b2_client::{BucketType, Config, Session, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Session::authenticate(&Config::default(), "account-id", "app-key").await?;
//!
//!     let bucket = session.create_bucket("my-bucket", BucketType::AllPrivate).await?;
//!     let mut bucket = session.bucket(bucket);
//!
//!     let file = UploadFile::new("hello.txt", 5, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
//!     let info = bucket.upload_file(&b"hello"[..], file).await?;
//!
//!     let mut data = Vec::new();
//!     session.download_by_id(&info.file_id, &mut data).await?;
//!     println!("Content: {}", String::from_utf8_lossy(&data));
//!
//!     Ok(())
//! }
//! ```

mod config;
mod download;
pub mod encoding;
mod error;
mod handle;
mod listing;
mod session;
pub mod transport;
mod types;
mod upload;

pub use config::{Config, Credentials, DEFAULT_AUTH_URL};
pub use download::file_info_from_headers;
pub use error::{ApiError, ClientError, ErrorKind, Result};
pub use handle::{BucketHandle, Handle};
pub use listing::{FileNamesPage, FileVersionsPage, VersionCursor};
pub use session::{AccountAuthorization, Session};
pub use types::*;
pub use upload::{UploadFile, UploadLease};
