// Error types module

use thiserror::Error;

/// Centralized error type for signing, listing and store calls
///
/// Structural failures (bad URL, missing XML root, bad expiry) are never
/// defaulted away: they indicate an input or programming error and surface
/// immediately. Field-level listing problems are recovered in the mapper
/// and never reach this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Descriptor URL could not be parsed into host/path/query
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// XML body is not a document of the expected kind
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The clock could not provide a time representable in the signing format
    #[error("Clock unavailable: {0}")]
    ClockUnavailable(String),

    /// Presign expiry outside 1..=604800 seconds
    #[error("Invalid presign expiry: {0} seconds (must be 1..=604800)")]
    InvalidExpiry(u64),

    /// Opaque failure from the HTTP layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store answered with a non-2xx status
    #[error("Store returned {status}{}: {body}", code_suffix(.code))]
    Status {
        status: u16,
        code: Option<String>,
        body: String,
    },

    /// Configuration errors (invalid YAML, missing env vars, bad bounds)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether a caller-side retry policy may try the call again.
    ///
    /// The core never retries on its own; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Status { status, code, .. } => {
                *status >= 500 || matches!(code.as_deref(), Some("SlowDown"))
            }
            _ => false,
        }
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, StoreError>;
