//! Rendered output cache for content items.

use std::sync::Arc;

use tessera_sdk::plugin::ContentPlugin;
use tessera_sdk::types::{ContentItem, SiteId};
use tracing::{debug, warn};

use super::keys::{derive_key, derive_site_key, list_cache_keys};
use super::CacheStore;
use crate::content::SiteRegistry;
use crate::error::InvalidationError;

/// Reads and writes rendered item output.
///
/// A render reads and writes exactly one entry: the site-scoped key when
/// the plugin caches per site, the base key otherwise. Clearing removes
/// every site variant.
///
/// Store failures on reads and writes only cost a re-render, so they are
/// logged and treated as a miss. Failures while clearing are returned,
/// since a silently failed invalidation leaves stale output behind.
#[derive(Clone)]
pub struct OutputCache {
    store: Arc<dyn CacheStore>,
    sites: Arc<dyn SiteRegistry>,
}

impl OutputCache {
    pub fn new(store: Arc<dyn CacheStore>, sites: Arc<dyn SiteRegistry>) -> Self {
        Self { store, sites }
    }

    /// The key a render on `site` reads and writes.
    pub fn cache_key(
        plugin: &dyn ContentPlugin,
        placeholder: &str,
        instance: &ContentItem,
        site: SiteId,
    ) -> String {
        if plugin.cache_output_per_site() {
            derive_site_key(placeholder, instance, site)
        } else {
            derive_key(placeholder, instance)
        }
    }

    /// Every key the item's output may be stored under.
    pub async fn cache_keys(
        &self,
        plugin: &dyn ContentPlugin,
        placeholder: &str,
        instance: &ContentItem,
        current_site: SiteId,
    ) -> Result<Vec<String>, InvalidationError> {
        if !plugin.cache_output_per_site() {
            return Ok(list_cache_keys(placeholder, instance, false, &[], current_site));
        }

        let known_sites = self.sites.list_site_ids().await?;
        Ok(list_cache_keys(
            placeholder,
            instance,
            true,
            &known_sites,
            current_site,
        ))
    }

    /// Whether clearing with `current_site` reaches entries written for `site`.
    ///
    /// True for the current site and for every registered site. A failing
    /// registry reads as false.
    pub async fn clears_site(&self, site: SiteId, current_site: SiteId) -> bool {
        if site == current_site {
            return true;
        }
        match self.sites.list_site_ids().await {
            Ok(known) => known.contains(&site),
            Err(e) => {
                warn!(error = %e, site = %site, "site registry unavailable");
                false
            }
        }
    }

    /// Cached output for an item, if any.
    pub async fn get(
        &self,
        plugin: &dyn ContentPlugin,
        placeholder: &str,
        instance: &ContentItem,
        site: SiteId,
    ) -> Option<String> {
        let key = Self::cache_key(plugin, placeholder, instance, site);
        match self.store.get(&key).await {
            Ok(Some(html)) => {
                debug!(key = %key, "output cache hit");
                Some(html)
            }
            Ok(None) => {
                debug!(key = %key, "output cache miss");
                None
            }
            Err(e) => {
                warn!(error = %e, key = %key, "output cache read failed, rendering uncached");
                None
            }
        }
    }

    /// Store rendered output for an item.
    pub async fn set(
        &self,
        plugin: &dyn ContentPlugin,
        placeholder: &str,
        instance: &ContentItem,
        site: SiteId,
        html: &str,
    ) {
        let key = Self::cache_key(plugin, placeholder, instance, site);
        if let Err(e) = self.store.set(&key, html).await {
            warn!(error = %e, key = %key, "output cache write failed");
        }
    }

    /// Remove every cached variant of an item's output.
    ///
    /// Returns the number of keys cleared.
    pub async fn clear(
        &self,
        plugin: &dyn ContentPlugin,
        placeholder: &str,
        instance: &ContentItem,
        current_site: SiteId,
    ) -> Result<usize, InvalidationError> {
        let keys = self
            .cache_keys(plugin, placeholder, instance, current_site)
            .await?;
        self.store.delete(&keys).await?;

        debug!(keys = ?keys, "output cache cleared");
        Ok(keys.len())
    }
}

impl std::fmt::Debug for OutputCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCache").finish()
    }
}
