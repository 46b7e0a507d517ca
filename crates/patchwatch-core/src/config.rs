//! Configuration types for the patchwatch system

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether a run performs ordinary change detection or deliberately
/// re-broadcasts the current state of every fetchable app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Notify only on build id changes (consults the `normal` namespace)
    Normal,
    /// Re-notify every app with fetchable data (consults the `force`
    /// namespace; refreshes both namespaces on update)
    Force,
}

/// Engine configuration
///
/// Retry, batching and pacing knobs for a single run. All fields have
/// conservative defaults; an all-default config is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Maximum send attempts per message chunk
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial backoff between send attempts (doubles per attempt)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_retry_backoff_cap_ms")]
    pub retry_backoff_cap_ms: u64,

    /// Cooldown applied when the channel rate-limits us without naming
    /// its own retry-after interval
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,

    /// Pause between consecutive chunk sends, even on success. Respects
    /// the channel's own rate limits.
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,

    /// Byte budget per message chunk. Kept below the channel's hard
    /// message limit to leave room for formatting markup.
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,

    /// Number of feed fetches in flight at once
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,
}

impl WatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be > 0"));
        }
        if self.max_chunk_bytes == 0 {
            return Err(crate::Error::config("max_chunk_bytes must be > 0"));
        }
        if self.fetch_batch_size == 0 {
            return Err(crate::Error::config("fetch_batch_size must be > 0"));
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn retry_backoff_cap(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_cap_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_delay_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_backoff_cap_ms: default_retry_backoff_cap_ms(),
            rate_limit_cooldown_ms: default_rate_limit_cooldown_ms(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
            max_chunk_bytes: default_max_chunk_bytes(),
            fetch_batch_size: default_fetch_batch_size(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

fn default_retry_backoff_cap_ms() -> u64 {
    30_000
}

fn default_rate_limit_cooldown_ms() -> u64 {
    5_000
}

fn default_inter_chunk_delay_ms() -> u64 {
    1_000
}

fn default_max_chunk_bytes() -> usize {
    4_000
}

fn default_fetch_batch_size() -> usize {
    5
}
