//! In-process store backed by Moka.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::{CacheStore, CacheStoreError};

/// In-process cache store.
///
/// Entries are local to this process; other instances never see them.
#[derive(Clone)]
pub struct MemoryStore {
    local: Cache<String, String>,
}

impl MemoryStore {
    /// Create a store holding at most `max_capacity` entries, each expiring
    /// after `ttl` when given.
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            local: builder.build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(super::MAX_CAPACITY, None)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        Ok(self.local.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        self.local.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheStoreError> {
        for key in keys {
            self.local.invalidate(key).await;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.local.entry_count())
            .finish()
    }
}
