// # State Store Trait
//
// Defines the interface for persistent last-known-build state.
//
// ## Purpose
//
// The state store is what makes runs idempotent: a build id that was
// already notified is remembered across restarts, so re-running the
// engine with unchanged feeds produces zero notifications.
//
// ## Namespaces
//
// Two independent namespaces live in one durable document:
//
// - `normal`: consulted and updated by ordinary runs
// - `force`:  consulted by force runs (which refresh both namespaces)
//
// Keeping them separate lets a force run re-broadcast everything without
// disturbing what the normal path considers "already seen".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::RunMode;
use crate::traits::feed_fetcher::AppId;

/// Persisted per-app record
///
/// Older state files may lack `display_name` or `last_checked_at`;
/// missing fields default rather than failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Last build id we notified for this app
    pub build_id: String,

    /// Normalized display name at the time of the last notification
    #[serde(default)]
    pub display_name: String,

    /// When this app was last checked
    #[serde(default = "epoch")]
    pub last_checked_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Full known state: both namespaces, keyed by app id rendered as a string
///
/// Each namespace defaults to empty independently, so a document written
/// by an older engine that knew only one namespace still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownState {
    #[serde(default)]
    pub normal: HashMap<String, AppState>,

    #[serde(default)]
    pub force: HashMap<String, AppState>,
}

impl KnownState {
    /// Look up the record consulted by the given run mode
    pub fn get(&self, mode: RunMode, app: AppId) -> Option<&AppState> {
        self.namespace(mode).get(&app.to_string())
    }

    /// Record a build id for an app
    ///
    /// A force run refreshes both namespaces together; a normal run
    /// touches only `normal`.
    pub fn record(&mut self, mode: RunMode, app: AppId, state: AppState) {
        let key = app.to_string();
        match mode {
            RunMode::Normal => {
                self.normal.insert(key, state);
            }
            RunMode::Force => {
                self.normal.insert(key.clone(), state.clone());
                self.force.insert(key, state);
            }
        }
    }

    /// Number of apps tracked in the given mode's namespace
    pub fn len(&self, mode: RunMode) -> usize {
        self.namespace(mode).len()
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.force.is_empty()
    }

    fn namespace(&self, mode: RunMode) -> &HashMap<String, AppState> {
        match mode {
            RunMode::Normal => &self.normal,
            RunMode::Force => &self.force,
        }
    }
}

/// Trait for state store implementations
///
/// Stores are single-writer per run: the engine holds one in-memory
/// working copy, mutates it during detection, and commits it once. No
/// component mutates state concurrently by design.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last durable state
    ///
    /// Implementations must degrade gracefully: a missing or corrupt
    /// stored representation yields an empty state (logged), not an
    /// error. Only total I/O unavailability is an error.
    async fn load(&self) -> Result<KnownState, crate::Error>;

    /// Durably write the full state
    ///
    /// After this returns (or after a crash mid-call), a subsequent
    /// `load` observes either the previous or the new complete state,
    /// never a partial write.
    async fn commit(&self, state: &KnownState) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_state(build: &str) -> AppState {
        AppState {
            build_id: build.to_string(),
            display_name: "Game".to_string(),
            last_checked_at: Utc::now(),
        }
    }

    #[test]
    fn normal_record_leaves_force_namespace_alone() {
        let mut state = KnownState::default();
        state.record(RunMode::Normal, AppId(100), app_state("A"));

        assert!(state.get(RunMode::Normal, AppId(100)).is_some());
        assert!(state.get(RunMode::Force, AppId(100)).is_none());
    }

    #[test]
    fn force_record_refreshes_both_namespaces() {
        let mut state = KnownState::default();
        state.record(RunMode::Force, AppId(100), app_state("B"));

        assert_eq!(
            state.get(RunMode::Normal, AppId(100)).map(|s| s.build_id.as_str()),
            Some("B")
        );
        assert_eq!(
            state.get(RunMode::Force, AppId(100)).map(|s| s.build_id.as_str()),
            Some("B")
        );
    }

    #[test]
    fn missing_fields_default_on_load() {
        // Document written by an engine that predates display_name
        let json = r#"{"normal":{"100":{"build_id":"123"}}}"#;
        let state: KnownState = serde_json::from_str(json).unwrap();

        let record = state.get(RunMode::Normal, AppId(100)).unwrap();
        assert_eq!(record.build_id, "123");
        assert_eq!(record.display_name, "");
    }

    #[test]
    fn unknown_namespace_defaults_empty() {
        let state: KnownState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
    }
}
