// Kasasagi: SigV4 request signing and S3-compatible listing core

pub mod client;
pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod s3;

pub use client::{StoreClient, Transport};
pub use config::Config;
pub use error::{Result, StoreError};
