//! Core watch engine
//!
//! The WatchEngine sequences one run of the diff-and-delivery pipeline:
//!
//! ```text
//! AppListSource ──► FeedFetcher (bounded batches, concurrent)
//!                        │
//!                        ▼
//!                  Change Detector ──► in-memory KnownState copy
//!                        │
//!                        ▼
//!                  Message Batcher ──► DeliveryEngine ──► MessageChannel
//!                        │
//!                        ▼
//!                  StateStore::commit   (single durable mutation point)
//! ```
//!
//! Per-app fetch failures degrade to `NoData`; per-chunk delivery
//! failures are contained in the report. Only an unreadable app list or
//! total state-store unavailability fails a run.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::batch::render_chunks;
use crate::config::{RunMode, WatchConfig};
use crate::delivery::DeliveryEngine;
use crate::detector::{Classification, ChangeRecord, detect};
use crate::error::Result;
use crate::traits::{
    AppListSource, FeedEntry, FeedFetcher, MessageChannel, StateStore,
};
use crate::traits::feed_fetcher::AppId;

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: RunMode,
    /// Apps in the list this run
    pub checked: usize,
    pub no_data: usize,
    pub first_seen: usize,
    pub changed: usize,
    pub forced: usize,
    pub unchanged: usize,
    pub chunks_sent: usize,
    pub chunks_failed: usize,
    /// Whether the in-memory state was durably committed
    pub committed: bool,
}

impl RunReport {
    fn new(mode: RunMode, checked: usize) -> Self {
        Self {
            mode,
            checked,
            no_data: 0,
            first_seen: 0,
            changed: 0,
            forced: 0,
            unchanged: 0,
            chunks_sent: 0,
            chunks_failed: 0,
            committed: false,
        }
    }

    /// Number of notification records produced this run
    pub fn notified(&self) -> usize {
        self.first_seen + self.changed + self.forced
    }
}

/// Core watch engine
///
/// Owns one instance of each collaborator. Runs are one-shot: construct,
/// call [`WatchEngine::run`], read the report. Concurrent runs against
/// the same state location are not supported; serialize them externally.
pub struct WatchEngine {
    app_list: Box<dyn AppListSource>,
    fetcher: Arc<dyn FeedFetcher>,
    channel: Box<dyn MessageChannel>,
    state_store: Box<dyn StateStore>,
    config: WatchConfig,
}

impl WatchEngine {
    pub fn new(
        app_list: Box<dyn AppListSource>,
        fetcher: Arc<dyn FeedFetcher>,
        channel: Box<dyn MessageChannel>,
        state_store: Box<dyn StateStore>,
        config: WatchConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            app_list,
            fetcher,
            channel,
            state_store,
            config,
        })
    }

    /// Execute one run
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: The run completed; inspect the report for
    ///   per-app and per-chunk outcomes
    /// - `Err(Error)`: A run-fatal condition (app list unreadable,
    ///   state store unavailable)
    pub async fn run(&self, mode: RunMode) -> Result<RunReport> {
        let apps = self.app_list.load().await?;
        info!(mode = ?mode, apps = apps.len(), "run started");

        let mut state = self.state_store.load().await?;
        let mut report = RunReport::new(mode, apps.len());

        // Fetch phase: concurrent within each batch, results re-joined in
        // app-list order. Each task owns its result; nothing is shared.
        let fetched = self.fetch_all(&apps).await;

        // Detect phase: sequential, mutating the in-memory copy only.
        let now = chrono::Utc::now();
        let mut records: Vec<ChangeRecord> = Vec::new();

        for (app, entry) in &fetched {
            let (classification, record) = detect(*app, entry.as_ref(), &mut state, mode, now);

            match classification {
                Classification::NoData => {
                    debug!(app = %app, "no data this run");
                    report.no_data += 1;
                }
                Classification::FirstSeen => report.first_seen += 1,
                Classification::Changed => report.changed += 1,
                Classification::Forced => report.forced += 1,
                Classification::Unchanged => report.unchanged += 1,
            }

            if let Some(record) = record {
                debug!(app = %app, build = %record.build_id, "change detected");
                records.push(record);
            }
        }

        // No records means detection never touched the state; skip the
        // commit so an all-quiet run leaves the file's mtime alone.
        if records.is_empty() {
            info!("no updates found");
            return Ok(report);
        }

        // Batch and deliver.
        let budget = self
            .config
            .max_chunk_bytes
            .min(self.channel.max_message_bytes());
        let chunks = render_chunks(&records, budget);
        info!(
            records = records.len(),
            chunks = chunks.len(),
            "delivering updates"
        );

        let delivery = DeliveryEngine::new(self.channel.as_ref(), &self.config)
            .deliver(&chunks)
            .await;
        report.chunks_sent = delivery.sent();
        report.chunks_failed = delivery.failed();

        if !delivery.all_sent() {
            warn!(
                failed = delivery.failed(),
                "some chunks were not delivered; state is committed anyway, \
                 re-broadcast with a force run if needed"
            );
        }

        // Single durable mutation point. Committed after delivery
        // regardless of per-chunk outcomes; cancellation anywhere above
        // leaves the previous state intact.
        self.state_store.commit(&state).await?;
        report.committed = true;

        info!(
            notified = report.notified(),
            sent = report.chunks_sent,
            failed = report.chunks_failed,
            "run complete"
        );
        Ok(report)
    }

    /// Fetch the latest entry for every app, `fetch_batch_size` in flight
    /// at a time
    ///
    /// Failures are entity-scoped: a fetch error or panicked task is
    /// logged and yields `None` for that app alone.
    async fn fetch_all(&self, apps: &[AppId]) -> Vec<(AppId, Option<FeedEntry>)> {
        let mut results = Vec::with_capacity(apps.len());

        for batch in apps.chunks(self.config.fetch_batch_size) {
            let mut handles = Vec::with_capacity(batch.len());

            for &app in batch {
                let fetcher = Arc::clone(&self.fetcher);
                handles.push((
                    app,
                    tokio::spawn(async move { fetcher.latest(app).await }),
                ));
            }

            for (app, handle) in handles {
                let entry = match handle.await {
                    Ok(Ok(entry)) => entry,
                    Ok(Err(e)) => {
                        warn!(app = %app, "fetch failed: {}", e);
                        None
                    }
                    Err(e) => {
                        warn!(app = %app, "fetch task panicked: {}", e);
                        None
                    }
                };
                results.push((app, entry));
            }
        }

        results
    }
}
