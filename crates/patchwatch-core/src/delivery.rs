//! Chunk delivery
//!
//! Sends rendered chunks through the messaging channel, strictly in
//! order. Retry policy lives here, not in channel implementations: the
//! engine owns pacing, backoff and rate-limit cooldowns so that every
//! channel behaves the same way under failure.
//!
//! A chunk that exhausts its attempt budget is recorded as failed and
//! delivery moves on; partial delivery is preferred over total loss.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::batch::MessageChunk;
use crate::config::WatchConfig;
use crate::traits::message_channel::{ChannelError, MessageChannel};

/// Per-chunk delivery outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Sent,
    Failed { reason: String },
}

/// Outcomes for one delivery pass, in chunk order
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    outcomes: Vec<ChunkOutcome>,
}

impl DeliveryReport {
    pub fn outcomes(&self) -> &[ChunkOutcome] {
        &self.outcomes
    }

    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ChunkOutcome::Sent))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    pub fn all_sent(&self) -> bool {
        self.failed() == 0
    }
}

/// Sends chunks with bounded retry and failure isolation
pub struct DeliveryEngine<'a> {
    channel: &'a dyn MessageChannel,
    max_attempts: usize,
    backoff: Duration,
    backoff_cap: Duration,
    rate_limit_cooldown: Duration,
    inter_chunk_delay: Duration,
}

impl<'a> DeliveryEngine<'a> {
    pub fn new(channel: &'a dyn MessageChannel, config: &WatchConfig) -> Self {
        Self {
            channel,
            max_attempts: config.max_attempts,
            backoff: config.retry_backoff(),
            backoff_cap: config.retry_backoff_cap(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
            inter_chunk_delay: config.inter_chunk_delay(),
        }
    }

    /// Deliver all chunks sequentially
    ///
    /// Never returns an error: every failure is contained in the report.
    pub async fn deliver(&self, chunks: &[MessageChunk]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (index, chunk) in chunks.iter().enumerate() {
            let outcome = self.send_with_retry(index, chunk).await;

            if matches!(outcome, ChunkOutcome::Sent) && index + 1 < chunks.len() {
                // Pause between chunks even on success; the channel has
                // its own rate limits.
                tokio::time::sleep(self.inter_chunk_delay).await;
            }

            report.outcomes.push(outcome);
        }

        report
    }

    async fn send_with_retry(&self, index: usize, chunk: &MessageChunk) -> ChunkOutcome {
        let mut backoff = self.backoff;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.channel.send(chunk.text()).await {
                Ok(()) => {
                    debug!(
                        chunk = index,
                        attempt,
                        bytes = chunk.len_bytes(),
                        "chunk sent via {}",
                        self.channel.channel_name()
                    );
                    return ChunkOutcome::Sent;
                }
                Err(e) => {
                    warn!(chunk = index, attempt, "send failed: {}", e);
                    let retryable = e.is_retryable();

                    // A rate-limit response carries a mandatory cooldown,
                    // independent of the backoff schedule.
                    if let ChannelError::RateLimited { retry_after } = &e {
                        let cooldown = retry_after.unwrap_or(self.rate_limit_cooldown);
                        info!(chunk = index, ?cooldown, "rate limited, cooling down");
                        tokio::time::sleep(cooldown).await;
                    }

                    last_error = e.to_string();

                    if !retryable {
                        break;
                    }

                    if attempt < self.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(self.backoff_cap);
                    }
                }
            }
        }

        warn!(chunk = index, "delivery abandoned: {}", last_error);
        ChunkOutcome::Failed { reason: last_error }
    }
}
