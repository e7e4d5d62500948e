//! AWS Signature Version 4 signer: header signing and presigned URLs.
//!
//! The signer is an immutable value. Credentials are fixed at construction,
//! every per-call input travels through arguments, and the only impure input
//! (the current time) comes from an injectable [`Clock`]. A single `Signer`
//! can be shared across threads without locking.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

use super::canonical::{
    create_canonical_request, payload_hash, sha256_hex, CanonicalHeaders, CanonicalRequest,
    UNSIGNED_PAYLOAD,
};
use super::clock::{Clock, SystemClock};
use super::encoding::{canonical_query_string, canonical_uri, parse_query};
use super::signing_key::{
    calculate_signature, create_string_to_sign, derive_signing_key, CredentialScope, ALGORITHM,
};
use crate::error::{Result, StoreError};

/// Longest presign validity SigV4 allows (7 days)
pub const MAX_PRESIGN_EXPIRY: u64 = 604_800;

/// Default service name for S3-compatible stores
pub const DEFAULT_SERVICE: &str = "s3";

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_STAMP_FORMAT: &str = "%Y%m%d";
const SIGNATURE_PARAM: &str = "X-Amz-Signature";

/// Access key pair plus the region/service the signatures are scoped to
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            service: DEFAULT_SERVICE.to_string(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

/// One request to be signed
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Absolute URL: scheme, host, path and optional query
    pub url: String,
    /// Extra headers to sign; names are folded to lower case
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Signed output of [`Signer::sign`]: the unchanged URL plus every header to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    /// Lower-cased header names, including `authorization`
    pub headers: BTreeMap<String, String>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn authorization(&self) -> Option<&str> {
        self.header("authorization")
    }
}

/// URL split into the parts SigV4 signs
struct SigningTarget {
    scheme: String,
    /// Host with any non-default port
    host: String,
    canonical_uri: String,
    query: Vec<(String, String)>,
}

impl SigningTarget {
    fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| StoreError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(StoreError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                raw,
                url.scheme()
            )));
        }

        let host_str = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StoreError::InvalidUrl(format!("{}: missing host", raw)))?;

        // Url::port() is None for the scheme's default port
        let host = match url.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            canonical_uri: canonical_uri(url.path()),
            query: url.query().map(parse_query).unwrap_or_default(),
        })
    }
}

/// AWS Signature Version 4 signer
#[derive(Clone)]
pub struct Signer {
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Signer reading the wall clock
    pub fn new(credentials: Credentials) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock))
    }

    pub fn with_clock(credentials: Credentials, clock: Arc<dyn Clock>) -> Self {
        Self { credentials, clock }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign a request with an `Authorization` header, timestamped now
    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedRequest> {
        let now = self.clock.now()?;
        self.sign_at(descriptor, now)
    }

    /// Sign a request with an `Authorization` header at a given instant
    ///
    /// Deterministic: the same descriptor and instant give byte-identical
    /// output.
    pub fn sign_at(&self, descriptor: &RequestDescriptor, at: DateTime<Utc>) -> Result<SignedRequest> {
        let target = SigningTarget::parse(&descriptor.url)?;

        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        let date_stamp = at.format(DATE_STAMP_FORMAT).to_string();
        let content_hash = payload_hash(&descriptor.body);

        // Caller headers first so the three mandatory ones always win
        let mut headers = CanonicalHeaders::new();
        for (name, value) in &descriptor.headers {
            headers.insert(name, value);
        }
        headers.insert("host", &target.host);
        headers.insert("x-amz-date", &amz_date);
        headers.insert("x-amz-content-sha256", &content_hash);

        let query_string = canonical_query_string(&target.query);
        let method = descriptor.method.as_str().to_ascii_uppercase();

        let canonical_request = create_canonical_request(&CanonicalRequest {
            method: &method,
            uri: &target.canonical_uri,
            query_string: &query_string,
            headers: &headers,
            payload_hash: &content_hash,
        });

        let scope = self.scope(&date_stamp);
        let signature = self.signature(&date_stamp, &amz_date, &scope, &canonical_request);
        let signed_headers = headers.signed_headers();

        tracing::debug!(
            method = %method,
            host = %target.host,
            signed_headers = %signed_headers,
            canonical_request_hash = %sha256_hex(canonical_request.as_bytes()),
            "Signed request"
        );

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key, scope, signed_headers, signature
        );

        let mut headers = headers.into_map();
        headers.insert("authorization".to_string(), authorization);

        Ok(SignedRequest {
            url: descriptor.url.clone(),
            headers,
        })
    }

    /// Presigned GET URL valid for `expires_in` seconds from now
    pub fn presign(&self, url: &str, expires_in: u64) -> Result<String> {
        let now = self.clock.now()?;
        self.presign_at(url, expires_in, now)
    }

    /// Presigned GET URL valid for `expires_in` seconds from `at`
    ///
    /// Query parameters already on `url` are kept and signed; any that
    /// collide with a signing parameter name are replaced by it.
    pub fn presign_at(&self, url: &str, expires_in: u64, at: DateTime<Utc>) -> Result<String> {
        if expires_in == 0 || expires_in > MAX_PRESIGN_EXPIRY {
            return Err(StoreError::InvalidExpiry(expires_in));
        }

        let target = SigningTarget::parse(url)?;

        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        let date_stamp = at.format(DATE_STAMP_FORMAT).to_string();
        let scope = self.scope(&date_stamp);

        let signing_params = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.credentials.access_key, scope),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires_in.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];

        // A stale signature from an earlier presign must not be signed over
        let mut params: Vec<(String, String)> = target
            .query
            .into_iter()
            .filter(|(k, _)| {
                k != SIGNATURE_PARAM && !signing_params.iter().any(|(name, _)| name == k)
            })
            .collect();
        params.extend(
            signing_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone())),
        );

        let query_string = canonical_query_string(&params);

        let mut headers = CanonicalHeaders::new();
        headers.insert("host", &target.host);

        let canonical_request = create_canonical_request(&CanonicalRequest {
            method: "GET",
            uri: &target.canonical_uri,
            query_string: &query_string,
            headers: &headers,
            payload_hash: UNSIGNED_PAYLOAD,
        });

        let signature = self.signature(&date_stamp, &amz_date, &scope, &canonical_request);

        tracing::debug!(
            host = %target.host,
            expires_in = expires_in,
            canonical_request_hash = %sha256_hex(canonical_request.as_bytes()),
            "Presigned URL"
        );

        Ok(format!(
            "{}://{}{}?{}&{}={}",
            target.scheme, target.host, target.canonical_uri, query_string, SIGNATURE_PARAM, signature
        ))
    }

    fn scope(&self, date_stamp: &str) -> CredentialScope {
        CredentialScope::new(
            date_stamp,
            &self.credentials.region,
            &self.credentials.service,
        )
    }

    fn signature(
        &self,
        date_stamp: &str,
        amz_date: &str,
        scope: &CredentialScope,
        canonical_request: &str,
    ) -> String {
        let string_to_sign = create_string_to_sign(amz_date, scope, canonical_request);
        let signing_key = derive_signing_key(
            &self.credentials.secret_key,
            date_stamp,
            &self.credentials.region,
            &self.credentials.service,
        );
        calculate_signature(&signing_key, &string_to_sign)
    }
}
