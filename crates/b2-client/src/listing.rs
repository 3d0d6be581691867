//! Paginated file name and file version listing
//!
//! Both listings hand back a resume cursor with each page. The cursor is
//! not an offset: it is replayed verbatim as the start of the next call,
//! and its absence means the listing is exhausted.

use crate::{types::FileName, ClientError, Result, Session};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Resume position for version listing; name and id always travel together
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCursor {
    /// File name to resume at
    pub file_name: String,
    /// File id to resume at within that name
    pub file_id: String,
}

impl VersionCursor {
    /// Create a cursor from its parts
    pub fn new(file_name: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_id: file_id.into(),
        }
    }
}

/// One page of `b2_list_file_names`
#[derive(Clone, Debug)]
pub struct FileNamesPage {
    /// Latest visible version of each name, alphabetical
    pub files: Vec<FileName>,
    /// Start name for the next page; `None` once exhausted
    pub next_file_name: Option<String>,
}

impl FileNamesPage {
    /// Whether this was the last page
    pub fn is_last(&self) -> bool {
        self.next_file_name.is_none()
    }
}

/// One page of `b2_list_file_versions`
#[derive(Clone, Debug)]
pub struct FileVersionsPage {
    /// Versions ordered by name, newest first within a name
    pub files: Vec<FileName>,
    /// Start position for the next page; `None` once exhausted
    pub next: Option<VersionCursor>,
}

impl FileVersionsPage {
    /// Whether this was the last page
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFileNamesRequest<'a> {
    bucket_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_file_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFileNamesResponse {
    files: Vec<FileName>,
    #[serde(default)]
    next_file_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFileVersionsRequest<'a> {
    bucket_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_file_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_file_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFileVersionsResponse {
    files: Vec<FileName>,
    #[serde(default)]
    next_file_name: Option<String>,
    #[serde(default)]
    next_file_id: Option<String>,
}

impl ListFileVersionsResponse {
    fn into_page(self) -> Result<FileVersionsPage> {
        let next = match (non_empty(self.next_file_name), non_empty(self.next_file_id)) {
            (Some(file_name), Some(file_id)) => Some(VersionCursor { file_name, file_id }),
            (None, None) => None,
            (name, id) => {
                return Err(ClientError::Decode(format!(
                    "incomplete version cursor: nextFileName={:?} nextFileId={:?}",
                    name, id
                )))
            }
        };

        Ok(FileVersionsPage {
            files: self.files,
            next,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_empty_str(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Session {
    /// List the latest visible version of each file name, alphabetically
    ///
    /// Pass the page's `next_file_name` as `start_file_name` to continue.
    #[instrument(skip(self))]
    pub async fn list_file_names(
        &self,
        bucket_id: &str,
        start_file_name: Option<&str>,
        max_file_count: Option<u32>,
    ) -> Result<FileNamesPage> {
        let body = ListFileNamesRequest {
            bucket_id,
            start_file_name: non_empty_str(start_file_name),
            max_file_count: max_file_count.filter(|n| *n > 0),
        };
        let response: ListFileNamesResponse = self.post_json("b2_list_file_names", &body).await?;

        Ok(FileNamesPage {
            files: response.files,
            next_file_name: non_empty(response.next_file_name),
        })
    }

    /// List every version of every file, by name then newest first
    #[instrument(skip(self))]
    pub async fn list_file_versions(
        &self,
        bucket_id: &str,
        start: Option<&VersionCursor>,
        max_file_count: Option<u32>,
    ) -> Result<FileVersionsPage> {
        let body = ListFileVersionsRequest {
            bucket_id,
            start_file_name: start.map(|c| c.file_name.as_str()),
            start_file_id: start.map(|c| c.file_id.as_str()),
            max_file_count: max_file_count.filter(|n| *n > 0),
        };
        let response: ListFileVersionsResponse =
            self.post_json("b2_list_file_versions", &body).await?;

        response.into_page()
    }

    /// Version listing with the two resume fields given separately
    ///
    /// Both or neither must be set; supplying only one is rejected before
    /// any request is made.
    pub async fn list_file_versions_from(
        &self,
        bucket_id: &str,
        start_file_name: Option<&str>,
        start_file_id: Option<&str>,
        max_file_count: Option<u32>,
    ) -> Result<FileVersionsPage> {
        let start = match (non_empty_str(start_file_name), non_empty_str(start_file_id)) {
            (Some(name), Some(id)) => Some(VersionCursor::new(name, id)),
            (None, None) => None,
            _ => {
                return Err(ClientError::Config(
                    "start file name and start file id must be given together".to_string(),
                ))
            }
        };

        self.list_file_versions(bucket_id, start.as_ref(), max_file_count)
            .await
    }
}
