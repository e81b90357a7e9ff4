//! Content type registry.
//!
//! Resolves the persisted entity type id for each plugin's item type. The
//! plugin pool resolves every id once, during initialization.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use tracing::{debug, info};

use super::RegistryError;

/// Maps item type names to entity type ids.
#[async_trait]
pub trait ContentTypeRegistry: Send + Sync {
    /// Return the entity type id for an item type, registering the type
    /// when it is new.
    ///
    /// Fails with [`RegistryError::Unavailable`] when the registry has not
    /// been initialized.
    async fn entity_type_id(&self, type_name: &str) -> Result<i64, RegistryError>;
}

/// In-memory registry.
///
/// Starts uninitialized; lookups fail until [`initialize`](Self::initialize)
/// has been called. Ids are handed out in registration order, starting at 1.
#[derive(Debug, Default)]
pub struct MemoryContentTypes {
    types: DashMap<String, i64>,
    last_id: AtomicI64,
    initialized: AtomicBool,
}

impl MemoryContentTypes {
    /// Create an uninitialized registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that is ready for lookups.
    pub fn initialized() -> Self {
        let registry = Self::new();
        registry.initialize();
        registry
    }

    /// Mark the registry as ready.
    pub fn initialize(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[async_trait]
impl ContentTypeRegistry for MemoryContentTypes {
    async fn entity_type_id(&self, type_name: &str) -> Result<i64, RegistryError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(RegistryError::unavailable(
                type_name,
                "content type registry not initialized",
            ));
        }

        let id = *self
            .types
            .entry(type_name.to_string())
            .or_insert_with(|| self.last_id.fetch_add(1, Ordering::AcqRel) + 1);

        debug!(type_name = %type_name, id = id, "resolved content type");
        Ok(id)
    }
}

/// Registry backed by the `content_type` table.
///
/// Queried before the schema exists, the database error surfaces as
/// [`RegistryError::Unavailable`].
#[derive(Debug, Clone)]
pub struct PgContentTypes {
    pool: PgPool,
}

impl PgContentTypes {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentTypeRegistry for PgContentTypes {
    async fn entity_type_id(&self, type_name: &str) -> Result<i64, RegistryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO content_type (type_name)
            VALUES ($1)
            ON CONFLICT (type_name) DO UPDATE SET type_name = EXCLUDED.type_name
            RETURNING id
            "#,
        )
        .bind(type_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RegistryError::unavailable(type_name, e.to_string()))?;

        info!(type_name = %type_name, id = id, "registered content type");
        Ok(id)
    }
}
