// # Memory State Store
//
// In-memory implementation of StateStore.
//
// Nothing survives a restart: the first run after a crash treats every
// app as first-seen and re-notifies. Useful for tests and throwaway
// deployments where that is acceptable.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{KnownState, StateStore};

/// In-memory state store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<KnownState>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with state
    pub fn with_state(state: KnownState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Snapshot the currently committed state
    pub async fn snapshot(&self) -> KnownState {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<KnownState, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn commit(&self, state: &KnownState) -> Result<(), Error> {
        *self.inner.write().await = state.clone();
        Ok(())
    }
}
