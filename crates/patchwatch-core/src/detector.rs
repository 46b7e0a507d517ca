//! Change detection
//!
//! Compares a fetched feed entry against the known state and classifies
//! each app as first-seen / changed / forced / unchanged / no-data. The
//! classification is an explicit value, never control flow: a failed or
//! empty fetch is `NoData` for that app and the run moves on.
//!
//! Detection mutates only the in-memory working copy of the state; the
//! durable commit is the orchestrator's job.

use chrono::{DateTime, Utc};

use crate::config::RunMode;
use crate::traits::feed_fetcher::{AppId, FeedEntry};
use crate::traits::state_store::{AppState, KnownState};

/// Outcome of change detection for one app in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Fetch failed or the feed carried no entries; app skipped this run
    NoData,
    /// App has no entry in the consulted namespace
    FirstSeen,
    /// Build id differs from the stored one
    Changed,
    /// Force mode: re-notified regardless of the stored build id
    Forced,
    /// Build id matches the stored one; nothing to do
    Unchanged,
}

impl Classification {
    /// Whether this classification produced a notification record
    pub fn notifies(&self) -> bool {
        matches!(
            self,
            Classification::FirstSeen | Classification::Changed | Classification::Forced
        )
    }
}

/// One detected change, ephemeral within a single run
///
/// At most one record exists per app per run. Records are ordered by
/// `published_at` before rendering; fetch completion order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub app_id: AppId,
    pub display_name: String,
    pub build_id: String,
    pub published_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Render the single notification line for this record
    ///
    /// Format: `[GAME][<id>] <name> (<build_id>) <YYYY/MM/DD HH:MM>`,
    /// timestamp in UTC.
    pub fn render_line(&self) -> String {
        format!(
            "[GAME][{}] {} ({}) {}",
            self.app_id,
            self.display_name,
            self.build_id,
            self.published_at.format("%Y/%m/%d %H:%M")
        )
    }
}

/// Classify one app against the known state
///
/// Updates the in-memory state for every classification that notifies;
/// `NoData` and `Unchanged` leave the state untouched. Apps are
/// independent: no call observes another app's outcome.
pub fn detect(
    app: AppId,
    fetched: Option<&FeedEntry>,
    state: &mut KnownState,
    mode: RunMode,
    now: DateTime<Utc>,
) -> (Classification, Option<ChangeRecord>) {
    let Some(entry) = fetched else {
        return (Classification::NoData, None);
    };

    let stored = state.get(mode, app);

    let classification = match (stored, mode) {
        (None, _) => Classification::FirstSeen,
        (Some(_), RunMode::Force) => Classification::Forced,
        (Some(prev), RunMode::Normal) if prev.build_id != entry.build_id => {
            Classification::Changed
        }
        _ => Classification::Unchanged,
    };

    if !classification.notifies() {
        return (classification, None);
    }

    let name = display_name(&entry.raw_title);
    state.record(
        mode,
        app,
        AppState {
            build_id: entry.build_id.clone(),
            display_name: name.clone(),
            last_checked_at: now,
        },
    );

    let record = ChangeRecord {
        app_id: app,
        display_name: name,
        build_id: entry.build_id.clone(),
        published_at: entry.published_at,
    };

    (classification, Some(record))
}

/// Normalize a feed entry title into a display name
///
/// Strips the trailing `" update for ..."` platform suffix, then keeps
/// only the first variant when the title carries two language variants
/// separated by `/` (e.g. `"怪物猎人/Monster Hunter"`). Pure function.
pub fn display_name(raw_title: &str) -> String {
    let clean = raw_title
        .split(" update for ")
        .next()
        .unwrap_or(raw_title);
    match clean.split_once('/') {
        Some((first, _)) => first.to_string(),
        None => clean.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(title: &str, build: &str, published: DateTime<Utc>) -> FeedEntry {
        FeedEntry {
            raw_title: title.to_string(),
            build_id: build.to_string(),
            published_at: published,
            link: "https://steamdb.info/patchnotes/1/".to_string(),
        }
    }

    fn seeded(app: u64, build: &str) -> KnownState {
        let mut state = KnownState::default();
        state.record(
            RunMode::Normal,
            AppId(app),
            AppState {
                build_id: build.to_string(),
                display_name: format!("Game{}", app),
                last_checked_at: Utc::now(),
            },
        );
        state
    }

    #[test]
    fn changed_build_yields_one_record_with_rendered_line() {
        let mut state = seeded(100, "A");
        let published = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let fetched = entry("Game100 update for 2 January", "B", published);

        let (class, record) =
            detect(AppId(100), Some(&fetched), &mut state, RunMode::Normal, Utc::now());

        assert_eq!(class, Classification::Changed);
        let record = record.unwrap();
        assert_eq!(record.render_line(), "[GAME][100] Game100 (B) 2024/01/02 10:00");
        assert_eq!(
            state.get(RunMode::Normal, AppId(100)).unwrap().build_id,
            "B"
        );
    }

    #[test]
    fn unknown_app_is_first_seen_and_added_to_state() {
        let mut state = KnownState::default();
        let fetched = entry("Game200", "C", Utc::now());

        let (class, record) =
            detect(AppId(200), Some(&fetched), &mut state, RunMode::Normal, Utc::now());

        assert_eq!(class, Classification::FirstSeen);
        assert!(record.is_some());
        assert_eq!(
            state.get(RunMode::Normal, AppId(200)).unwrap().build_id,
            "C"
        );
    }

    #[test]
    fn matching_build_is_unchanged_and_state_untouched() {
        let mut state = seeded(100, "A");
        let before = state.clone();
        let fetched = entry("Game100", "A", Utc::now());

        let (class, record) =
            detect(AppId(100), Some(&fetched), &mut state, RunMode::Normal, Utc::now());

        assert_eq!(class, Classification::Unchanged);
        assert!(record.is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn missing_fetch_is_no_data() {
        let mut state = seeded(100, "A");
        let before = state.clone();

        let (class, record) = detect(AppId(100), None, &mut state, RunMode::Normal, Utc::now());

        assert_eq!(class, Classification::NoData);
        assert!(record.is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn force_mode_notifies_even_when_unchanged() {
        // Same build in both namespaces: Normal stays quiet, Force re-notifies.
        let mut state = seeded(100, "A");
        state.record(
            RunMode::Force,
            AppId(100),
            state.get(RunMode::Normal, AppId(100)).unwrap().clone(),
        );
        let fetched = entry("Game100", "A", Utc::now());

        let (class, _) =
            detect(AppId(100), Some(&fetched), &mut state.clone(), RunMode::Normal, Utc::now());
        assert_eq!(class, Classification::Unchanged);

        let (class, record) =
            detect(AppId(100), Some(&fetched), &mut state, RunMode::Force, Utc::now());
        assert_eq!(class, Classification::Forced);
        assert!(record.is_some());
    }

    #[test]
    fn force_mode_refreshes_both_namespaces() {
        let mut state = KnownState::default();
        let fetched = entry("Game300", "Z", Utc::now());

        detect(AppId(300), Some(&fetched), &mut state, RunMode::Force, Utc::now());

        assert_eq!(state.get(RunMode::Normal, AppId(300)).unwrap().build_id, "Z");
        assert_eq!(state.get(RunMode::Force, AppId(300)).unwrap().build_id, "Z");
    }

    #[test]
    fn display_name_strips_platform_suffix() {
        assert_eq!(display_name("Half-Life update for 19 June"), "Half-Life");
    }

    #[test]
    fn display_name_keeps_first_language_variant() {
        assert_eq!(
            display_name("怪物猎人：世界/Monster Hunter: World update for 1 May"),
            "怪物猎人：世界"
        );
    }

    #[test]
    fn display_name_passes_plain_titles_through() {
        assert_eq!(display_name("Dota 2"), "Dota 2");
    }
}
