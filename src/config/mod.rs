// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::StoreError;
use crate::s3::{Credentials, DEFAULT_SERVICE, MAX_PRESIGN_EXPIRY};

/// Largest page ListObjectsV2 will return
pub const MAX_KEYS_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub presign: PresignConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint and credentials of the S3-compatible store
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_service")]
    pub service: String,
    pub access_key: String,
    pub secret_key: String,
    /// Request timeout in seconds for the bundled HTTP transport
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_key, &self.secret_key, &self.region)
            .with_service(&self.service)
    }

    /// Endpoint without trailing slash
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_max_keys")]
    pub max_keys: u32,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_keys: default_max_keys(),
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignConfig {
    /// Default validity of presigned URLs in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

impl Default for PresignConfig {
    fn default() -> Self {
        Self {
            expires_in: default_expires_in(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset (e.g. "info", "kasasagi=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_keys() -> u32 {
    MAX_KEYS_LIMIT
}

fn default_delimiter() -> String {
    "/".to_string()
}

fn default_expires_in() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse YAML, replacing `${VAR_NAME}` with environment variable values
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, StoreError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| StoreError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                StoreError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let store = &self.store;

        if store.access_key.trim().is_empty() {
            return Err(StoreError::Config("Store access key cannot be empty".to_string()));
        }
        if store.secret_key.trim().is_empty() {
            return Err(StoreError::Config("Store secret key cannot be empty".to_string()));
        }
        if store.region.trim().is_empty() {
            return Err(StoreError::Config("Store region cannot be empty".to_string()));
        }
        if store.service.trim().is_empty() {
            return Err(StoreError::Config("Store service cannot be empty".to_string()));
        }

        let endpoint = Url::parse(&store.endpoint).map_err(|e| {
            StoreError::Config(format!("Store endpoint '{}' is not a valid URL: {}", store.endpoint, e))
        })?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(StoreError::Config(format!(
                "Store endpoint '{}' must use http or https",
                store.endpoint
            )));
        }
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(StoreError::Config(format!(
                "Store endpoint '{}' has no host",
                store.endpoint
            )));
        }
        if store.timeout == 0 {
            return Err(StoreError::Config(
                "Store timeout must be > 0 seconds".to_string(),
            ));
        }

        if self.listing.max_keys == 0 || self.listing.max_keys > MAX_KEYS_LIMIT {
            return Err(StoreError::Config(format!(
                "listing.max_keys {} must be between 1 and {}",
                self.listing.max_keys, MAX_KEYS_LIMIT
            )));
        }
        if self.listing.delimiter.is_empty() {
            return Err(StoreError::Config(
                "listing.delimiter cannot be empty".to_string(),
            ));
        }

        if self.presign.expires_in == 0 || self.presign.expires_in > MAX_PRESIGN_EXPIRY {
            return Err(StoreError::Config(format!(
                "presign.expires_in {} must be between 1 and {}",
                self.presign.expires_in, MAX_PRESIGN_EXPIRY
            )));
        }

        Ok(())
    }
}
