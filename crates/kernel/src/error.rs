//! Kernel error types.

use tessera_sdk::error::SourceError;
use thiserror::Error;

use crate::cache::CacheStoreError;
use crate::content::RegistryError;
use crate::plugin::PoolError;

/// Errors while clearing cached output.
///
/// Unlike cache reads and writes, invalidation failures are always
/// reported: swallowing them would leave stale output in the cache.
#[derive(Debug, Error)]
pub enum InvalidationError {
    #[error("cannot enumerate cache keys: {0}")]
    Registry(#[from] RegistryError),

    #[error("cannot clear cached output: {0}")]
    Store(#[from] CacheStoreError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("cannot enumerate content items: {0}")]
    Source(#[from] SourceError),
}

/// Result type alias using InvalidationError.
pub type InvalidationResult<T> = Result<T, InvalidationError>;
