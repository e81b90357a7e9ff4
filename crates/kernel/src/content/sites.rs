//! Site registry for multi-site deployments.

use async_trait::async_trait;
use sqlx::PgPool;
use tessera_sdk::types::SiteId;

use super::RegistryError;

/// Enumerates the sites known to the deployment.
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    async fn list_site_ids(&self) -> Result<Vec<SiteId>, RegistryError>;
}

/// A fixed list of sites, typically taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSites {
    sites: Vec<SiteId>,
}

impl StaticSites {
    pub fn new(sites: impl IntoIterator<Item = SiteId>) -> Self {
        Self {
            sites: sites.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SiteRegistry for StaticSites {
    async fn list_site_ids(&self) -> Result<Vec<SiteId>, RegistryError> {
        Ok(self.sites.clone())
    }
}

/// Sites stored in the `site` table.
#[derive(Debug, Clone)]
pub struct PgSites {
    pool: PgPool,
}

impl PgSites {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteRegistry for PgSites {
    async fn list_site_ids(&self) -> Result<Vec<SiteId>, RegistryError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM site ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RegistryError::SitesUnavailable(e.to_string()))?;

        Ok(ids.into_iter().map(SiteId).collect())
    }
}
