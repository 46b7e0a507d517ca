// # App List Sources
//
// Implementations of the AppListSource trait.
//
// The app list is the run's target set. Unlike state-file corruption,
// an unreadable list is run-fatal: silently checking nothing would look
// like a healthy run with no updates.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::traits::app_list::AppListSource;
use crate::traits::feed_fetcher::AppId;

/// App list backed by a JSON file containing an array of numeric app ids
///
/// ```json
/// [440, 570, 730]
/// ```
///
/// Order is preserved as written; it determines nothing but display.
#[derive(Debug)]
pub struct FileAppList {
    path: PathBuf,
}

impl FileAppList {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl AppListSource for FileAppList {
    async fn load(&self) -> Result<Vec<AppId>, Error> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::app_list(format!(
                "Failed to read app list {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let ids: Vec<u64> = serde_json::from_str(&content).map_err(|e| {
            Error::app_list(format!(
                "Failed to parse app list {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if ids.is_empty() {
            return Err(Error::app_list(format!(
                "App list {} is empty",
                self.path.display()
            )));
        }

        Ok(ids.into_iter().map(AppId).collect())
    }
}

/// Fixed in-memory app list, for tests and embedding
#[derive(Debug, Clone)]
pub struct StaticAppList {
    ids: Vec<AppId>,
}

impl StaticAppList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().map(AppId).collect(),
        }
    }
}

#[async_trait]
impl AppListSource for StaticAppList {
    async fn load(&self) -> Result<Vec<AppId>, Error> {
        Ok(self.ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_list_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.json");
        fs::write(&path, "[730, 440, 570]").await.unwrap();

        let list = FileAppList::new(&path);
        let ids = list.load().await.unwrap();
        assert_eq!(ids, vec![AppId(730), AppId(440), AppId(570)]);
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let list = FileAppList::new(dir.path().join("nope.json"));
        assert!(matches!(list.load().await, Err(Error::AppList(_))));
    }

    #[tokio::test]
    async fn empty_list_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.json");
        fs::write(&path, "[]").await.unwrap();

        let list = FileAppList::new(&path);
        assert!(matches!(list.load().await, Err(Error::AppList(_))));
    }

    #[tokio::test]
    async fn malformed_json_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.json");
        fs::write(&path, "{\"apps\": oops").await.unwrap();

        let list = FileAppList::new(&path);
        assert!(list.load().await.is_err());
    }
}
