// # App List Source Trait
//
// Supplies the ordered set of app ids to check. Read once per run.
//
// Unlike feed fetches, a failure here is fatal to the run: without a
// target list there is nothing to do, and the operator needs to know.

use async_trait::async_trait;

use crate::traits::feed_fetcher::AppId;

/// Trait for app list implementations
#[async_trait]
pub trait AppListSource: Send + Sync {
    /// Load the ordered list of apps to check
    ///
    /// # Returns
    ///
    /// - `Ok(ids)`: The list, in display order
    /// - `Err(Error)`: The list is unreadable (run-fatal)
    async fn load(&self) -> Result<Vec<AppId>, crate::Error>;
}
