// # File State Store
//
// File-based implementation of StateStore with crash-safe commits.
//
// ## Crash safety
//
// - Atomic writes: new state goes to a sibling `.tmp` file which is
//   renamed over the canonical path
// - Corruption detection: JSON is validated on load
// - Degradation: a corrupt or missing file loads as empty state (the
//   next run re-detects and re-notifies; nothing is silently lost)
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "normal": { "440": { "build_id": "12345", "display_name": "Game", "last_checked_at": "..." } },
//   "force": {}
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::state_store::{KnownState, StateStore};

/// State file format version, for future migration if the format changes
const STATE_FILE_VERSION: &str = "1.0";

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    #[serde(default = "default_version")]
    version: String,
    #[serde(flatten)]
    state: KnownState,
}

fn default_version() -> String {
    STATE_FILE_VERSION.to_string()
}

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use patchwatch_core::state::FileStateStore;
/// use patchwatch_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/patchwatch/state.json").await?;
///     let state = store.load().await?;
///     store.commit(&state).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a file state store, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self { path })
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<KnownState, Error> {
        if !self.path.exists() {
            tracing::debug!("State file does not exist: {}", self.path.display());
            return Ok(KnownState::default());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        // Corruption is a non-fatal degradation: log, start empty, let the
        // next commit rewrite a complete document.
        match serde_json::from_str::<StateFileFormat>(&content) {
            Ok(file) => {
                if file.version != STATE_FILE_VERSION {
                    tracing::warn!(
                        "State file version mismatch: expected {}, got {}. Loading anyway.",
                        STATE_FILE_VERSION,
                        file.version
                    );
                }
                tracing::debug!(
                    "Loaded state: {} normal / {} force records",
                    file.state.normal.len(),
                    file.state.force.len()
                );
                Ok(file.state)
            }
            Err(e) => {
                tracing::warn!(
                    "State file {} is corrupt ({}). Starting with empty state.",
                    self.path.display(),
                    e
                );
                Ok(KnownState::default())
            }
        }
    }

    async fn commit(&self, state: &KnownState) -> Result<(), Error> {
        let file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            state: state.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut f = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            f.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            f.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> canonical)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State committed to {}", self.path.display());
        Ok(())
    }
}
