//! Wire constants and file name encoding

use crate::{ClientError, Result};

/// API version path appended to every base URL
pub const API_PREFIX: &str = "/b2api/v1";

/// Header carrying the percent-encoded file name
pub const FILE_NAME_HEADER: &str = "X-Bz-File-Name";

/// Header carrying the file id on downloads
pub const FILE_ID_HEADER: &str = "X-Bz-File-Id";

/// Header carrying the declared SHA-1
pub const CONTENT_SHA1_HEADER: &str = "X-Bz-Content-Sha1";

/// Prefix of every custom file info header
pub const INFO_HEADER_PREFIX: &str = "X-Bz-Info-";

/// Reserved info key for the source modification time
pub const LAST_MODIFIED_INFO_KEY: &str = "src_last_modified_millis";

/// Content type asking the service to detect the type itself
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";

/// Percent-encode a file name, keeping `/` as the path separator
pub fn encode_file_name(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a percent-encoded file name; `+` is accepted as a space
pub fn decode_file_name(encoded: &str) -> Result<String> {
    let spaced = encoded.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|name| name.into_owned())
        .map_err(|e| ClientError::Decode(format!("file name '{}' is not valid UTF-8: {}", encoded, e)))
}
