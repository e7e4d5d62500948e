//! Raw store responses, S3 error documents and HEAD metadata.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Represents a response from the store as handed back by a transport
#[derive(Debug, Clone)]
pub struct StoreResponse {
    pub status_code: u16,
    /// Header names lower-cased on construction
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl StoreResponse {
    pub fn new<I, K, V>(status_code: u16, headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        StoreResponse {
            status_code,
            headers,
            body: body.into(),
        }
    }

    /// Returns true if the response indicates success (2xx status code)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Gets a header value by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as text, lossy for non-UTF-8 bytes
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into [`StoreError::Status`]
    ///
    /// The raw body is kept as diagnostic text; the S3 error code is filled
    /// in when the body is an `<Error>` document.
    pub fn error_for_status(self) -> Result<Self, StoreError> {
        if self.is_success() {
            return Ok(self);
        }
        let body = self.body_text();
        let code = parse_error_body(&body).map(|e| e.code);
        Err(StoreError::Status {
            status: self.status_code,
            code,
            body,
        })
    }
}

/// Decoded S3 `<Error>` document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3ErrorBody {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Extract code and message from an S3 XML error body
///
/// Returns None when the body is not an error document or carries no code.
pub fn parse_error_body(body: &str) -> Option<S3ErrorBody> {
    if !body.contains("<Error") {
        return None;
    }
    quick_xml::de::from_str::<S3ErrorBody>(body)
        .ok()
        .filter(|e| !e.code.is_empty())
}

/// Object metadata from a HEAD response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_length: u64,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ObjectMetadata {
    pub fn from_response(response: &StoreResponse) -> Self {
        ObjectMetadata {
            content_type: response
                .get_header("content-type")
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            content_length: response
                .get_header("content-length")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            etag: response
                .get_header("etag")
                .map(|v| v.trim_matches('"').to_string()),
            last_modified: response.get_header("last-modified").map(str::to_string),
        }
    }
}
