// # patchwatchd - Patchwatch Daemon
//
// Thin integration layer for the patchwatch system. This binary only:
// 1. Reads configuration from environment variables
// 2. Initializes tracing and the tokio runtime
// 3. Wires the adapters into the core engine
// 4. Executes exactly one run and maps the result to an exit code
//
// All diff-and-delivery logic lives in patchwatch-core; feed and channel
// specifics live in their adapter crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `PATCHWATCH_BOT_TOKEN`: Telegram bot token (required)
// - `PATCHWATCH_CHAT_ID`: Target chat id or @channelname (required)
// - `PATCHWATCH_APP_LIST`: Path to the JSON app list (default: games.json)
// - `PATCHWATCH_STATE_PATH`: Path to the state file (default: state.json)
// - `PATCHWATCH_MAX_ATTEMPTS`: Send attempts per chunk (default: 3)
// - `PATCHWATCH_MAX_CHUNK_BYTES`: Chunk byte budget (default: 4000)
// - `PATCHWATCH_FETCH_BATCH_SIZE`: Concurrent fetches (default: 5)
// - `PATCHWATCH_LOG_LEVEL`: trace|debug|info|warn|error (default: info)
//
// ## CLI
//
// One optional flag: `--force` re-broadcasts the current state of every
// fetchable app instead of diffing against the normal namespace.
//
// ## Example
//
// ```bash
// export PATCHWATCH_BOT_TOKEN=123456:replace-with-real-token
// export PATCHWATCH_CHAT_ID=-1001234567890
// export PATCHWATCH_APP_LIST=/etc/patchwatch/games.json
// export PATCHWATCH_STATE_PATH=/var/lib/patchwatch/state.json
//
// patchwatchd            # normal diff run
// patchwatchd --force    # re-broadcast everything
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use patchwatch_channel_telegram::TelegramChannel;
use patchwatch_core::{FileAppList, FileStateStore, RunMode, WatchConfig, WatchEngine};
use patchwatch_feed_steamdb::SteamDbFetcher;

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (whether or not changes were found)
/// - 1: Configuration or startup error
/// - 2: Run-fatal runtime error (app list or state store unavailable)
#[derive(Debug, Clone, Copy)]
enum PatchwatchExitCode {
    Completed = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<PatchwatchExitCode> for ExitCode {
    fn from(code: PatchwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bot_token: String,
    chat_id: String,
    app_list_path: String,
    state_path: String,
    max_attempts: Option<usize>,
    max_chunk_bytes: Option<usize>,
    fetch_batch_size: Option<usize>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: env::var("PATCHWATCH_BOT_TOKEN").map_err(|_| {
                anyhow::anyhow!(
                    "PATCHWATCH_BOT_TOKEN is required. \
                    Set it via: export PATCHWATCH_BOT_TOKEN=your_token"
                )
            })?,
            chat_id: env::var("PATCHWATCH_CHAT_ID").map_err(|_| {
                anyhow::anyhow!(
                    "PATCHWATCH_CHAT_ID is required. \
                    Set it via: export PATCHWATCH_CHAT_ID=-100123456"
                )
            })?,
            app_list_path: env::var("PATCHWATCH_APP_LIST")
                .unwrap_or_else(|_| "games.json".to_string()),
            state_path: env::var("PATCHWATCH_STATE_PATH")
                .unwrap_or_else(|_| "state.json".to_string()),
            max_attempts: env::var("PATCHWATCH_MAX_ATTEMPTS")
                .ok()
                .map(|s| s.parse().unwrap_or(3)),
            max_chunk_bytes: env::var("PATCHWATCH_MAX_CHUNK_BYTES")
                .ok()
                .map(|s| s.parse().unwrap_or(4_000)),
            fetch_batch_size: env::var("PATCHWATCH_FETCH_BATCH_SIZE")
                .ok()
                .map(|s| s.parse().unwrap_or(5)),
            log_level: env::var("PATCHWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            anyhow::bail!("PATCHWATCH_BOT_TOKEN cannot be empty");
        }

        // Bot tokens look like "<numeric id>:<secret>"
        if !self.bot_token.contains(':') {
            anyhow::bail!(
                "PATCHWATCH_BOT_TOKEN does not look like a bot token \
                (expected '<id>:<secret>'). Verify the token from @BotFather."
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.bot_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "PATCHWATCH_BOT_TOKEN appears to be a placeholder. \
                Use an actual bot token."
            );
        }

        if self.chat_id.is_empty() {
            anyhow::bail!("PATCHWATCH_CHAT_ID cannot be empty");
        }

        if self.app_list_path.is_empty() {
            anyhow::bail!("PATCHWATCH_APP_LIST cannot be empty");
        }

        if self.state_path.is_empty() {
            anyhow::bail!("PATCHWATCH_STATE_PATH cannot be empty");
        }

        if let Some(attempts) = self.max_attempts
            && (attempts == 0 || attempts > 10)
        {
            anyhow::bail!("PATCHWATCH_MAX_ATTEMPTS must be between 1 and 10. Got: {}", attempts);
        }

        if let Some(bytes) = self.max_chunk_bytes
            && !(256..=4_096).contains(&bytes)
        {
            anyhow::bail!(
                "PATCHWATCH_MAX_CHUNK_BYTES must be between 256 and 4096 \
                (Telegram's hard limit). Got: {}",
                bytes
            );
        }

        if let Some(batch) = self.fetch_batch_size
            && (batch == 0 || batch > 50)
        {
            anyhow::bail!("PATCHWATCH_FETCH_BATCH_SIZE must be between 1 and 50. Got: {}", batch);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "PATCHWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the engine config, applying overrides over defaults
    fn watch_config(&self) -> WatchConfig {
        let mut config = WatchConfig::default();
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        if let Some(bytes) = self.max_chunk_bytes {
            config.max_chunk_bytes = bytes;
        }
        if let Some(batch) = self.fetch_batch_size {
            config.fetch_batch_size = batch;
        }
        config
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return PatchwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PatchwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PatchwatchExitCode::ConfigError.into();
    }

    let mode = if env::args().any(|a| a == "--force") {
        RunMode::Force
    } else {
        RunMode::Normal
    };

    info!("Starting patchwatchd ({:?} mode)", mode);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PatchwatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_once(config, mode).await {
            Ok(()) => PatchwatchExitCode::Completed,
            Err(e) => {
                error!("Run failed: {}", e);
                PatchwatchExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Wire the adapters and execute one run
async fn run_once(config: Config, mode: RunMode) -> Result<()> {
    let app_list = FileAppList::new(&config.app_list_path);
    let state_store = FileStateStore::new(&config.state_path).await?;
    let fetcher = SteamDbFetcher::new()?;
    let channel = TelegramChannel::new(&config.bot_token, &config.chat_id)?;

    let engine = WatchEngine::new(
        Box::new(app_list),
        Arc::new(fetcher),
        Box::new(channel),
        Box::new(state_store),
        config.watch_config(),
    )?;

    let report = engine.run(mode).await?;

    info!(
        checked = report.checked,
        notified = report.notified(),
        no_data = report.no_data,
        unchanged = report.unchanged,
        chunks_sent = report.chunks_sent,
        chunks_failed = report.chunks_failed,
        committed = report.committed,
        "run finished"
    );

    Ok(())
}
