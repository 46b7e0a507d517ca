// # Telegram Message Channel
//
// MessageChannel implementation backed by the Telegram Bot API
// (`sendMessage`).
//
// ## Responsibility boundary
//
// This channel is stateless and single-shot: one HTTP request per send,
// full error propagation to the delivery engine, which owns retries,
// backoff and rate-limit cooldowns. A 429 response is surfaced as
// `ChannelError::RateLimited` carrying Telegram's `retry_after` value so
// the engine can honor the channel-advised cooldown.
//
// ## Security
//
// The bot token NEVER appears in logs; the Debug implementation redacts
// it and error messages carry only the endpoint name.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use patchwatch_core::traits::{ChannelError, MessageChannel};
use patchwatch_core::Error;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Hard message length limit imposed by Telegram
const TELEGRAM_MAX_MESSAGE_BYTES: usize = 4_096;

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram message channel
pub struct TelegramChannel {
    /// Bot token. NEVER log this value.
    token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot token
impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramChannel {
    /// Create a channel against the production Telegram API
    ///
    /// # Parameters
    ///
    /// - `token`: Bot token from @BotFather
    /// - `chat_id`: Target chat (numeric id or `@channelname`)
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, Error> {
        Self::with_api_base(token, chat_id, TELEGRAM_API_BASE)
    }

    /// Create a channel against a custom API base URL (tests)
    pub fn with_api_base(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, Error> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }
        let chat_id = chat_id.into();
        if chat_id.is_empty() {
            return Err(Error::config("Telegram chat id cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::channel(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            chat_id,
            api_base: api_base.into(),
            client,
        })
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

/// Subset of the Telegram error response we care about
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Option<ApiErrorParameters>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorParameters {
    retry_after: Option<u64>,
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });

        let response = self
            .client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors can embed the URL, which contains the token
                ChannelError::Transient(format!(
                    "sendMessage transport error: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: ApiErrorBody = response
            .json()
            .await
            .unwrap_or(ApiErrorBody {
                description: String::new(),
                parameters: None,
            });

        if status.as_u16() == 429 {
            let retry_after = body
                .parameters
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            tracing::warn!(?retry_after, "Telegram rate limit hit");
            return Err(ChannelError::RateLimited { retry_after });
        }

        if status.is_server_error() {
            return Err(ChannelError::Transient(format!(
                "sendMessage HTTP {}: {}",
                status, body.description
            )));
        }

        // Remaining 4xx: the payload itself is the problem; retrying the
        // same bytes cannot succeed.
        Err(ChannelError::Rejected(format!(
            "sendMessage HTTP {}: {}",
            status, body.description
        )))
    }

    fn max_message_bytes(&self) -> usize {
        TELEGRAM_MAX_MESSAGE_BYTES
    }

    fn channel_name(&self) -> &'static str {
        "telegram"
    }
}
