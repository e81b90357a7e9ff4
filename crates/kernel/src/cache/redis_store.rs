//! Shared store backed by Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client as RedisClient;
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use super::{CacheStore, CacheStoreError};

/// Redis cache store.
///
/// A `ttl_secs` of zero stores entries without expiry.
#[derive(Clone)]
pub struct RedisStore {
    client: RedisClient,
    ttl_secs: u64,
}

impl RedisStore {
    pub fn new(client: RedisClient, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheStoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to get Redis connection for cache");
                CacheStoreError::Connection(e.to_string())
            })
    }
}

fn command_error(op: &'static str, e: redis::RedisError) -> CacheStoreError {
    CacheStoreError::Command {
        op,
        details: e.to_string(),
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(|e| command_error("get", e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;

        if self.ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(key, value, self.ttl_secs)
                .await
                .map_err(|e| command_error("set", e))?;
        } else {
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(|e| command_error("set", e))?;
        }

        debug!(key = %key, ttl = %self.ttl_secs, "cache set");
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheStoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        conn.del::<_, ()>(keys.to_vec())
            .await
            .map_err(|e| command_error("delete", e))?;

        debug!(keys = ?keys, "cache keys deleted");
        Ok(())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
