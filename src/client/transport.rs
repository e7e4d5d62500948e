//! HTTP transport seam between the store client and the network.

use async_trait::async_trait;
use http::Method;
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::s3::{SignedRequest, StoreResponse};

/// Sends an already-signed request and hands back the raw response
///
/// Implementations must not retry or rewrite the signed headers; retry and
/// backoff belong to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: &Method, request: &SignedRequest) -> Result<StoreResponse>;
}

/// Transport backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, method: &Method, request: &SignedRequest) -> Result<StoreResponse> {
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|e| StoreError::Transport(format!("unsupported method: {}", e)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            // reqwest derives Host from the URL; sending it twice confuses some stores
            if name == "host" {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(StoreResponse::new(status, headers, body))
    }
}
