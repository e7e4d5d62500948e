// Store client: builds and sends the S3 calls a browsing client needs
//
// ListBuckets, ListObjectsV2 (delimited), HeadObject and presigned GetObject
// URLs against one configured endpoint using path-style addressing.

pub mod transport;

use http::Method;
use std::sync::Arc;
use std::time::Duration;

pub use transport::{ReqwestTransport, Transport};

use crate::config::{Config, ListingConfig, PresignConfig, StoreConfig};
use crate::error::{Result, StoreError};
use crate::s3::{
    parse_buckets, parse_listing_with_delimiter, uri_encode, Bucket, Clock, ListingResult, ObjectMetadata,
    RequestDescriptor, SignedRequest, Signer, StoreResponse,
};

/// Upper bound on pages fetched by `list_all_objects`
const MAX_LIST_PAGES: usize = 10_000;

pub struct StoreClient {
    store: StoreConfig,
    listing: ListingConfig,
    presign: PresignConfig,
    signer: Signer,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("store", &self.store)
            .field("listing", &self.listing)
            .field("presign", &self.presign)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Validate the config and build a client on top of `transport`
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: config.store.clone(),
            listing: config.listing.clone(),
            presign: config.presign.clone(),
            signer: Signer::new(config.store.credentials()),
            transport,
        })
    }

    /// Client using the bundled `reqwest` transport
    pub fn with_http(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.store.timeout))?;
        Self::new(config, Arc::new(transport))
    }

    /// Replace the signing clock (tests pin it to a fixed instant)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.signer = Signer::with_clock(self.store.credentials(), clock);
        self
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// `<endpoint>/<bucket>/<key>` with the key encoded except for `/`
    ///
    /// URL parsing resolves `.` and `..` segments, so `a/../b.pdf` would
    /// address `b.pdf`. Such keys are rejected instead of signed.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<String> {
        let dot_segment = |s: &str| s == "." || s == "..";
        if dot_segment(bucket) || key.split('/').any(dot_segment) {
            return Err(StoreError::InvalidUrl(format!(
                "{}/{}: '.' and '..' path segments are not addressable",
                bucket, key
            )));
        }
        Ok(format!(
            "{}/{}/{}",
            self.store.base_url(),
            uri_encode(bucket, true),
            uri_encode(key, false)
        ))
    }

    pub fn list_buckets_request(&self) -> Result<SignedRequest> {
        let url = format!("{}/", self.store.base_url());
        self.signer.sign(&RequestDescriptor::get(url))
    }

    pub fn list_objects_request(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<SignedRequest> {
        let mut params: Vec<(&str, String)> = vec![
            ("list-type", "2".to_string()),
            ("delimiter", self.listing.delimiter.clone()),
        ];
        if !prefix.is_empty() {
            params.push(("prefix", prefix.to_string()));
        }
        if let Some(token) = continuation_token.filter(|t| !t.is_empty()) {
            params.push(("continuation-token", token.to_string()));
        }
        params.push(("max-keys", self.listing.max_keys.to_string()));

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!(
            "{}/{}?{}",
            self.store.base_url(),
            uri_encode(bucket, true),
            query
        );
        self.signer.sign(&RequestDescriptor::get(url))
    }

    pub fn head_object_request(&self, bucket: &str, key: &str) -> Result<SignedRequest> {
        self.signer
            .sign(&RequestDescriptor::head(self.object_url(bucket, key)?))
    }

    /// Presigned GET URL for an object; `None` uses the configured expiry
    pub fn presigned_url(&self, bucket: &str, key: &str, expires_in: Option<u64>) -> Result<String> {
        let expires_in = expires_in.unwrap_or(self.presign.expires_in);
        self.signer
            .presign(&self.object_url(bucket, key)?, expires_in)
    }

    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let request = self.list_buckets_request()?;
        let response = self.execute(Method::GET, &request).await?;
        let buckets = parse_buckets(&response.body_text())?;
        tracing::info!(count = buckets.len(), "Listed buckets");
        Ok(buckets)
    }

    /// One page of a delimited listing under `prefix`
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingResult> {
        let request = self.list_objects_request(bucket, prefix, continuation_token)?;
        let response = self.execute(Method::GET, &request).await?;
        let listing =
            parse_listing_with_delimiter(&response.body_text(), prefix, &self.listing.delimiter)?;
        tracing::info!(
            bucket = %bucket,
            prefix = %prefix,
            folders = listing.folders.len(),
            files = listing.files.len(),
            truncated = listing.is_truncated,
            "Listed objects"
        );
        Ok(listing)
    }

    /// Every page under `prefix`, following continuation tokens
    pub async fn list_all_objects(&self, bucket: &str, prefix: &str) -> Result<ListingResult> {
        let mut all = self.list_objects(bucket, prefix, None).await?;

        for _ in 1..MAX_LIST_PAGES {
            if !all.is_truncated {
                break;
            }
            let token = match all.next_continuation_token.clone() {
                Some(token) => token,
                None => {
                    tracing::warn!(
                        bucket = %bucket,
                        prefix = %prefix,
                        "Truncated listing without continuation token, stopping"
                    );
                    all.is_truncated = false;
                    break;
                }
            };
            let page = self.list_objects(bucket, prefix, Some(&token)).await?;
            all.merge_page(page);
        }

        Ok(all)
    }

    pub async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let request = self.head_object_request(bucket, key)?;
        let response = self.execute(Method::HEAD, &request).await?;
        Ok(ObjectMetadata::from_response(&response))
    }

    async fn execute(&self, method: Method, request: &SignedRequest) -> Result<StoreResponse> {
        let response = self.transport.send(&method, request).await?;
        if !response.is_success() {
            tracing::warn!(
                method = %method,
                url = %request.url,
                status = response.status_code,
                "Store returned error status"
            );
        }
        response.error_for_status()
    }
}
