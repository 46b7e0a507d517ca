// # patchwatch-core
//
// Core library for the patchwatch feed monitor: fetch → diff against
// persisted state → format → deliver, once per invocation.
//
// ## Architecture Overview
//
// - **AppListSource**: Trait supplying the ordered set of apps to check
// - **FeedFetcher**: Trait fetching the latest feed entry for one app
// - **MessageChannel**: Trait sending rendered notification chunks
// - **StateStore**: Trait persisting last-known-build state (idempotency)
// - **detector**: Classifies each app (no-data / first-seen / changed /
//   forced / unchanged) and mutates the in-memory working state
// - **batch**: Renders change records into byte-bounded message chunks
// - **DeliveryEngine**: Sequential sends with bounded retry and backoff
// - **WatchEngine**: Orchestrates one run and commits state once
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from adapters
// 2. **Failure Isolation**: One app's fetch failure or one chunk's send
//    failure never aborts a run
// 3. **Explicit Classification**: Skip decisions are values, not thrown
//    control flow
// 4. **Single Commit Point**: All stages mutate an in-memory copy; only
//    the orchestrator writes durable state, exactly once per run

pub mod applist;
pub mod batch;
pub mod config;
pub mod delivery;
pub mod detector;
pub mod engine;
pub mod error;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use applist::{FileAppList, StaticAppList};
pub use batch::{MessageChunk, render_chunks};
pub use config::{RunMode, WatchConfig};
pub use delivery::{ChunkOutcome, DeliveryEngine, DeliveryReport};
pub use detector::{ChangeRecord, Classification, detect, display_name};
pub use engine::{RunReport, WatchEngine};
pub use error::{Error, Result};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{
    AppId, AppListSource, AppState, ChannelError, FeedEntry, FeedFetcher, KnownState,
    MessageChannel, StateStore,
};
