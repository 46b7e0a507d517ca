//! Core traits for the patchwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AppListSource`]: Supply the ordered list of apps to check
//! - [`FeedFetcher`]: Fetch the latest feed entry for one app
//! - [`MessageChannel`]: Send rendered notification chunks
//! - [`StateStore`]: Persistent last-known-build state for change detection

pub mod app_list;
pub mod feed_fetcher;
pub mod message_channel;
pub mod state_store;

pub use app_list::AppListSource;
pub use feed_fetcher::{AppId, FeedEntry, FeedFetcher};
pub use message_channel::{ChannelError, MessageChannel};
pub use state_store::{AppState, KnownState, StateStore};
