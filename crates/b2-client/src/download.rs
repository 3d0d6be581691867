//! Streaming downloads and metadata reconstruction from response headers

use crate::{
    encoding::{
        decode_file_name, encode_file_name, API_PREFIX, CONTENT_SHA1_HEADER, FILE_ID_HEADER,
        FILE_NAME_HEADER, INFO_HEADER_PREFIX,
    },
    types::FileInfo,
    ClientError, Result, Session,
};
use futures::StreamExt;
use reqwest::{
    header::{self, HeaderMap},
    RequestBuilder,
};
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

impl Session {
    /// Download a file version by id into `sink`
    #[instrument(skip(self, sink))]
    pub async fn download_by_id<W>(&self, file_id: &str, sink: &mut W) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = format!(
            "{}{}/b2_download_file_by_id",
            self.download_url().trim_end_matches('/'),
            API_PREFIX
        );
        let request = self
            .authorized(self.transport.http().get(url))
            .query(&[("fileId", file_id)]);

        self.download(request, sink).await
    }

    /// Download the latest visible version of a file by bucket and name
    #[instrument(skip(self, sink))]
    pub async fn download_by_name<W>(
        &self,
        bucket_name: &str,
        file_name: &str,
        sink: &mut W,
    ) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = format!(
            "{}/file/{}/{}",
            self.download_url().trim_end_matches('/'),
            urlencoding::encode(bucket_name),
            encode_file_name(file_name)
        );
        let request = self.authorized(self.transport.http().get(url));

        self.download(request, sink).await
    }

    async fn download<W>(&self, request: RequestBuilder, sink: &mut W) -> Result<FileInfo>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        // An error status never reaches the sink
        let response = self.transport.send(request).await?;
        let headers = response.headers().clone();

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        debug!(bytes = written, "Download complete");

        file_info_from_headers(self.account_id(), &headers)
    }
}

/// Rebuild file metadata from the headers of a download response
pub fn file_info_from_headers(account_id: &str, headers: &HeaderMap) -> Result<FileInfo> {
    let raw_length = header_str(headers, header::CONTENT_LENGTH.as_str())?;
    let content_length = raw_length
        .parse::<u64>()
        .map_err(|e| ClientError::Decode(format!("invalid Content-Length '{}': {}", raw_length, e)))?;

    let info_prefix = INFO_HEADER_PREFIX.to_ascii_lowercase();
    let mut info = HashMap::new();
    for name in headers.keys() {
        let Some(key) = name.as_str().strip_prefix(info_prefix.as_str()) else {
            continue;
        };
        // The service never repeats an info header, only the first value counts
        info.insert(key.to_string(), header_str(headers, name.as_str())?.to_string());
    }

    Ok(FileInfo {
        account_id: account_id.to_string(),
        file_id: header_str(headers, FILE_ID_HEADER)?.to_string(),
        file_name: decode_file_name(header_str(headers, FILE_NAME_HEADER)?)?,
        bucket_id: String::new(),
        content_length,
        content_sha1: header_str(headers, CONTENT_SHA1_HEADER)?.to_string(),
        content_type: header_str(headers, header::CONTENT_TYPE.as_str())?.to_string(),
        info,
    })
}

/// First value of a header, empty when absent
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map_err(|_| ClientError::Decode(format!("header {} is not valid text", name))),
        None => Ok(""),
    }
}
