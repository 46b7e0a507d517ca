// # Feed Fetcher Trait
//
// Defines the interface for fetching the latest patchnotes feed entry
// for a single tracked app.
//
// ## Implementations
//
// - SteamDB PatchnotesRSS: `patchwatch-feed-steamdb` crate
// - Test doubles: contract tests within patchwatch-core

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Opaque stable identifier for a tracked app
///
/// Ordering is caller-supplied (the app list) and preserved for display
/// purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(pub u64);

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for AppId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The latest feed entry for one app at one point in time
///
/// Immutable once fetched. `build_id` is the sole identity used for
/// change detection: it is derived from the feed entry's GUID fragment
/// (the text after the final `#`), which changes exactly when a new
/// build is published. Display text is never used as identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title as published (e.g. "Foo/Bar update for 1 June")
    pub raw_title: String,
    /// Stable version token for change detection
    pub build_id: String,
    /// Publish timestamp of the entry
    pub published_at: DateTime<Utc>,
    /// Link to the patchnotes page
    pub link: String,
}

/// Trait for feed fetcher implementations
///
/// Fetchers are single-shot collaborators: one fetch per call, no retry
/// logic, no caching, no state access. The engine owns scheduling and
/// converts fetch errors into a per-app `NoData` classification, so a
/// failing fetcher never aborts a run.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the latest feed entry for the given app
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entry))`: The newest entry in the feed
    /// - `Ok(None)`: The feed exists but carries no entries
    /// - `Err(Error)`: Transport failure or unparsable feed
    async fn latest(&self, app: AppId) -> Result<Option<FeedEntry>, crate::Error>;

    /// Get the fetcher name (for logging/debugging)
    fn fetcher_name(&self) -> &'static str;
}
