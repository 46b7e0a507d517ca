// # Message Channel Trait
//
// Defines the interface for sending rendered notification chunks.
//
// ## Implementations
//
// - Telegram Bot API: `patchwatch-channel-telegram` crate
//
// ## Responsibility boundary
//
// Channels are stateless single-shot collaborators. A channel performs
// exactly one send per call and reports the outcome; retries, backoff
// and rate-limit cooldowns are owned by the delivery engine. If channels
// retried internally the engine could not pace sends or honor the
// channel's advertised retry-after interval.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure modes of a single send attempt
///
/// The delivery engine retries `RateLimited` and `Transient` failures up
/// to its attempt budget; `Rejected` failures are terminal for the chunk.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel asked us to slow down. `retry_after` carries the
    /// channel-advised cooldown when the response named one.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Transport-level failure that may succeed on retry
    #[error("transient send failure: {0}")]
    Transient(String),

    /// The channel refused the message; retrying the same payload
    /// cannot succeed
    #[error("send rejected: {0}")]
    Rejected(String),
}

impl ChannelError {
    /// Whether the delivery engine should attempt this send again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ChannelError::Rejected(_))
    }
}

/// Trait for messaging channel implementations
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Send one rendered chunk
    ///
    /// Must perform exactly one delivery attempt.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;

    /// Hard upper bound on message size imposed by the channel, in bytes
    ///
    /// The engine clamps its configured chunk budget to this value.
    fn max_message_bytes(&self) -> usize;

    /// Get the channel name (for logging/debugging)
    fn channel_name(&self) -> &'static str;
}
