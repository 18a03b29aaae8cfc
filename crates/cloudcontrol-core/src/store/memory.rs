// # Memory Profile Store
//
// Keeps the profile set in process memory. Nothing survives a restart.
// Used by tests and by callers that manage persistence themselves.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::profile::ConnectionProfile;
use crate::store::ProfileStore;

/// In-memory profile store
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    inner: Arc<RwLock<Vec<ConnectionProfile>>>,
}

impl MemoryProfileStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `profiles`
    pub fn with_profiles(profiles: Vec<ConnectionProfile>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(profiles)),
        }
    }

    /// Replace the held profiles without going through `save`
    pub async fn replace(&self, profiles: Vec<ConnectionProfile>) {
        *self.inner.write().await = profiles;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self) -> crate::Result<Vec<ConnectionProfile>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, profiles: &[ConnectionProfile]) -> crate::Result<()> {
        let mut sorted = profiles.to_vec();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        *self.inner.write().await = sorted;
        Ok(())
    }
}
