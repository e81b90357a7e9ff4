//! Key-value stores for rendered output.
//!
//! Two stores implement [`CacheStore`]:
//! - [`MemoryStore`]: Moka, in-process only
//! - [`RedisStore`]: Redis, shared across instances
//!
//! With Redis configured there is no in-process tier in front of it, so a
//! delete on one instance is seen by every instance.
//!
//! On top of the stores, [`keys`] derives cache keys for content items and
//! [`OutputCache`] reads and writes rendered item output.

pub mod keys;
mod memory;
mod output;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use memory::MemoryStore;
pub use output::OutputCache;
pub use redis_store::RedisStore;

use crate::config::Config;

/// Maximum in-process cache capacity.
pub const MAX_CAPACITY: u64 = 10_000;

/// Errors from a cache store.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    /// The store could not be reached.
    #[error("cache store unreachable: {0}")]
    Connection(String),

    /// The store was reached but the command failed.
    #[error("cache {op} failed: {details}")]
    Command { op: &'static str, details: String },
}

/// A shared key-value store.
///
/// Individual operations are atomic in the store. Nothing here locks across
/// operations; concurrent writers of the same key resolve as last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Write a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError>;

    /// Delete every listed key. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheStoreError>;
}

/// Build the store selected by configuration.
///
/// With `REDIS_URL` set output is cached in Redis only, otherwise
/// in-process only.
pub fn build_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    let ttl = (config.cache_ttl_secs > 0).then(|| Duration::from_secs(config.cache_ttl_secs));

    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("invalid REDIS_URL")?;
            info!("using shared output cache (Redis)");
            Ok(Arc::new(RedisStore::new(client, config.cache_ttl_secs)))
        }
        None => {
            info!("using in-process output cache");
            Ok(Arc::new(MemoryStore::new(MAX_CAPACITY, ttl)))
        }
    }
}
