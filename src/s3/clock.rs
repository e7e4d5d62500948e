//! Injectable time source for request signing.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StoreError};

/// Source of the signing instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<DateTime<Utc>>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StoreError::ClockUnavailable(format!("system time before epoch: {}", e)))?;
        let secs = i64::try_from(elapsed.as_secs())
            .map_err(|_| StoreError::ClockUnavailable("system time out of range".to_string()))?;
        DateTime::from_timestamp(secs, elapsed.subsec_nanos())
            .ok_or_else(|| StoreError::ClockUnavailable("system time out of range".to_string()))
    }
}

/// Clock pinned to one instant, for reproducible signatures
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> Result<DateTime<Utc>> {
        Ok(self.0)
    }
}
