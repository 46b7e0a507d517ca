//! Test doubles and common utilities for engine contract tests
//!
//! These mocks verify the engine's coordination behavior (classification,
//! batching, delivery, commit) without any real I/O.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use patchwatch_core::error::Result;
use patchwatch_core::traits::{
    AppId, ChannelError, FeedEntry, FeedFetcher, KnownState, MessageChannel, StateStore,
};
use patchwatch_core::{Error, WatchConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Engine config with millisecond-scale delays so tests stay fast
pub fn fast_config() -> WatchConfig {
    WatchConfig {
        max_attempts: 3,
        retry_backoff_ms: 1,
        retry_backoff_cap_ms: 4,
        rate_limit_cooldown_ms: 1,
        inter_chunk_delay_ms: 1,
        ..WatchConfig::default()
    }
}

pub fn entry(title: &str, build: &str, published: DateTime<Utc>) -> FeedEntry {
    FeedEntry {
        raw_title: title.to_string(),
        build_id: build.to_string(),
        published_at: published,
        link: format!("https://steamdb.info/patchnotes/{}/", build),
    }
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap()
}

/// What the mock fetcher should do for one app
#[derive(Clone)]
pub enum FetchPlan {
    Entry(FeedEntry),
    Empty,
    Fail(String),
}

/// Scripted FeedFetcher with per-app plans and a call counter
pub struct MockFetcher {
    plans: Mutex<HashMap<AppId, FetchPlan>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_entry(self, app: u64, entry: FeedEntry) -> Self {
        self.plans
            .lock()
            .unwrap()
            .insert(AppId(app), FetchPlan::Entry(entry));
        self
    }

    pub fn with_empty_feed(self, app: u64) -> Self {
        self.plans
            .lock()
            .unwrap()
            .insert(AppId(app), FetchPlan::Empty);
        self
    }

    pub fn with_failure(self, app: u64, msg: &str) -> Self {
        self.plans
            .lock()
            .unwrap()
            .insert(AppId(app), FetchPlan::Fail(msg.to_string()));
        self
    }

    /// Replace the plan for one app (e.g. between runs)
    pub fn set_entry(&self, app: u64, entry: FeedEntry) {
        self.plans
            .lock()
            .unwrap()
            .insert(AppId(app), FetchPlan::Entry(entry));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn latest(&self, app: AppId) -> Result<Option<FeedEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let plan = self.plans.lock().unwrap().get(&app).cloned();
        match plan {
            Some(FetchPlan::Entry(entry)) => Ok(Some(entry)),
            Some(FetchPlan::Empty) | None => Ok(None),
            Some(FetchPlan::Fail(msg)) => Err(Error::fetch(msg)),
        }
    }

    fn fetcher_name(&self) -> &'static str {
        "mock"
    }
}

/// Channel that records every sent text; optionally fails all sends
#[derive(Clone)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<String>>>,
    fail_all: bool,
    calls: Arc<AtomicUsize>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_all: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(&self, text: &str) -> std::result::Result<(), ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            return Err(ChannelError::Transient("scripted failure".into()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn max_message_bytes(&self) -> usize {
        4_096
    }

    fn channel_name(&self) -> &'static str {
        "recording"
    }
}

/// StateStore wrapper that counts commits and shares state across runs
#[derive(Clone, Default)]
pub struct SharedStateStore {
    state: Arc<Mutex<KnownState>>,
    commits: Arc<AtomicUsize>,
}

impl SharedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> KnownState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateStore for SharedStateStore {
    async fn load(&self) -> Result<KnownState> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn commit(&self, state: &KnownState) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }
}
