//! Canonical request assembly for AWS Signature Version 4.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// SHA-256 of an empty payload, used by every GET/HEAD
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Payload hash token for presigned URLs; never used for header signing
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Payload hash for a header-signed request body.
pub fn payload_hash(body: &[u8]) -> String {
    if body.is_empty() {
        EMPTY_SHA256.to_string()
    } else {
        sha256_hex(body)
    }
}

/// Header set keyed by lower-cased name.
///
/// Names are folded once on insert so two spellings of the same header can
/// never both end up in the signed set; the later insert wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalHeaders {
    entries: BTreeMap<String, String>,
}

impl CanonicalHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries
            .insert(name.to_ascii_lowercase(), value.trim().to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `name:value\n` for every header, sorted by name
    pub fn canonical_block(&self) -> String {
        let mut result = String::with_capacity(self.entries.len() * 64);
        for (k, v) in &self.entries {
            result.push_str(k);
            result.push(':');
            result.push_str(v);
            result.push('\n');
        }
        result
    }

    /// Sorted, semicolon-joined header names
    pub fn signed_headers(&self) -> String {
        self.entries
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

/// Inputs of one canonical request
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    /// Already canonical (see `encoding::canonical_uri`)
    pub uri: &'a str,
    /// Already canonical (see `encoding::canonical_query_string`)
    pub query_string: &'a str,
    pub headers: &'a CanonicalHeaders,
    pub payload_hash: &'a str,
}

pub fn create_canonical_request(request: &CanonicalRequest) -> String {
    // The header block carries its own trailing newline, so the blank line
    // before the signed header names falls out of the join.
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.to_ascii_uppercase(),
        request.uri,
        request.query_string,
        request.headers.canonical_block(),
        request.headers.signed_headers(),
        request.payload_hash
    )
}
