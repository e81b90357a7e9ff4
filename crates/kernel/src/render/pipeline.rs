//! Per-item rendering with output caching and error isolation.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tessera_sdk::error::RenderError;
use tessera_sdk::html;
use tessera_sdk::plugin::{ContentPlugin, ERROR_LABEL, ItemSource, RenderHost};
use tessera_sdk::request::{ContextMap, RenderRequest};
use tessera_sdk::types::{ContentItem, SiteId};
use tokio_stream::StreamExt;
use tracing::{debug, info, trace, warn};

use crate::cache::OutputCache;
use crate::config::Config;
use crate::error::InvalidationResult;
use crate::plugin::{PluginPool, PoolError};

/// Progress of a single item render.
///
/// Template selection and context building happen inside the plugin's
/// `render`; reaching the host's template call marks both as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderStage {
    NotStarted = 0,
    ContextBuilt = 1,
    Rendered = 2,
    CachedWrite = 3,
    Returned = 4,
    ErrorRendered = 5,
}

impl RenderStage {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::ContextBuilt,
            2 => Self::Rendered,
            3 => Self::CachedWrite,
            4 => Self::Returned,
            5 => Self::ErrorRendered,
            _ => Self::NotStarted,
        }
    }
}

/// How an item's output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Served from the output cache.
    Cached,
    /// Rendered by the plugin.
    Rendered,
    /// Rendering failed; the output is an error block.
    Failed,
    /// No plugin is registered for the item type.
    MissingPlugin,
    /// The placeholder does not accept the item's plugin.
    Skipped,
}

/// Rendered output of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutput {
    pub html: String,
    pub outcome: ItemOutcome,
}

impl ItemOutput {
    fn new(html: String, outcome: ItemOutcome) -> Self {
        Self { html, outcome }
    }
}

/// Rendered output of a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderOutput {
    /// Item output joined in render order.
    pub html: String,
    /// Per-item results, in render order.
    pub items: Vec<ItemOutput>,
}

impl PlaceholderOutput {
    /// Number of items with the given outcome.
    pub fn count(&self, outcome: ItemOutcome) -> usize {
        self.items.iter().filter(|i| i.outcome == outcome).count()
    }
}

/// Renders content items through their plugins.
///
/// Cached output is returned unchanged; staleness is handled by the save
/// and delete hooks. A failure in one item never affects its siblings and
/// error output is never written to the cache.
#[derive(Clone)]
pub struct RenderPipeline {
    pool: Arc<PluginPool>,
    cache: OutputCache,
    host: Arc<dyn RenderHost>,
    cache_output: bool,
    site_id: SiteId,
}

impl RenderPipeline {
    pub fn new(
        pool: Arc<PluginPool>,
        cache: OutputCache,
        host: Arc<dyn RenderHost>,
        config: &Config,
    ) -> Self {
        Self {
            pool,
            cache,
            host,
            cache_output: config.cache_output,
            site_id: config.site_id,
        }
    }

    pub fn pool(&self) -> &PluginPool {
        &self.pool
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    /// Site a request renders for.
    pub fn site_for(&self, request: &RenderRequest) -> SiteId {
        request.site_id.unwrap_or(self.site_id)
    }

    /// Render one item.
    pub async fn render_item(
        &self,
        request: &RenderRequest,
        placeholder: &str,
        instance: &ContentItem,
    ) -> ItemOutput {
        match self.pool.for_item(instance) {
            Ok(plugin) => {
                self.render_with_plugin(plugin.as_ref(), request, placeholder, instance)
                    .await
            }
            Err(e) => missing_plugin(instance, &e),
        }
    }

    /// Render one item with a known plugin, using the output cache when
    /// both the configuration and the plugin allow it.
    pub async fn render_with_plugin(
        &self,
        plugin: &dyn ContentPlugin,
        request: &RenderRequest,
        placeholder: &str,
        instance: &ContentItem,
    ) -> ItemOutput {
        let site = self.site_for(request);
        let cacheable = self.cache_output
            && plugin.cache_output()
            && self.site_is_clearable(plugin, site).await;

        if cacheable
            && let Some(html) = self.cache.get(plugin, placeholder, instance, site).await
        {
            trace!(item = %instance.id, stage = ?RenderStage::Returned, "served from cache");
            return ItemOutput::new(html, ItemOutcome::Cached);
        }

        match self.render_uncached(plugin, request, instance) {
            Ok(html) => {
                if cacheable {
                    self.cache
                        .set(plugin, placeholder, instance, site, &html)
                        .await;
                    trace!(item = %instance.id, stage = ?RenderStage::CachedWrite, "output cached");
                }
                trace!(item = %instance.id, stage = ?RenderStage::Returned, "item rendered");
                ItemOutput::new(html, ItemOutcome::Rendered)
            }
            Err(e) => {
                let html = self.render_error(plugin, request, &e);
                trace!(item = %instance.id, stage = ?RenderStage::ErrorRendered, "error rendered");
                ItemOutput::new(html, ItemOutcome::Failed)
            }
        }
    }

    /// Whether invalidation reaches the output a render on `site` writes.
    async fn site_is_clearable(&self, plugin: &dyn ContentPlugin, site: SiteId) -> bool {
        if !plugin.cache_output_per_site() || self.cache.clears_site(site, self.site_id).await {
            return true;
        }
        warn!(
            plugin = %plugin.name(),
            site = %site,
            "site is not registered, rendering without the output cache"
        );
        false
    }

    /// Call the plugin's `render` without touching the cache.
    ///
    /// Panics in plugin code are caught and returned as
    /// [`RenderError::Panicked`].
    pub fn render_uncached(
        &self,
        plugin: &dyn ContentPlugin,
        request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<String, RenderError> {
        let host = StageHost::new(self.host.as_ref());

        let result = catch_unwind(AssertUnwindSafe(|| {
            plugin.render(&host, request, instance)
        }))
        .unwrap_or_else(|payload| {
            Err(RenderError::Panicked {
                plugin: plugin.name().to_string(),
                message: panic_message(payload.as_ref()),
            })
        });

        match &result {
            Ok(_) => host.reach(RenderStage::Rendered),
            Err(e) => warn!(
                plugin = %plugin.name(),
                item = %instance.id,
                stage = ?host.stage(),
                error = %e,
                "content item failed to render"
            ),
        }
        result
    }

    /// Render an error block through the plugin, falling back to the
    /// standard block when the plugin's own `render_error` panics.
    fn render_error(
        &self,
        plugin: &dyn ContentPlugin,
        request: &RenderRequest,
        error: &RenderError,
    ) -> String {
        let host = self.host.as_ref();
        catch_unwind(AssertUnwindSafe(|| {
            plugin.render_error(host, request, error)
        }))
        .unwrap_or_else(|_| {
            html::error_block(&host.translate(request, ERROR_LABEL), &error.to_string())
        })
    }

    /// Render every item of a placeholder in sort order.
    pub async fn render_placeholder(
        &self,
        request: &RenderRequest,
        placeholder: &str,
        items: &[ContentItem],
    ) -> PlaceholderOutput {
        let mut ordered: Vec<&ContentItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.sort_order);

        let mut output = PlaceholderOutput::default();
        for instance in ordered {
            let item = match self.pool.for_item(instance) {
                Ok(plugin) if !self.pool.is_allowed(placeholder, plugin.as_ref()) => {
                    warn!(
                        plugin = %plugin.name(),
                        placeholder = %placeholder,
                        item = %instance.id,
                        "plugin not allowed in placeholder, skipping item"
                    );
                    ItemOutput::new(String::new(), ItemOutcome::Skipped)
                }
                Ok(plugin) => {
                    self.render_with_plugin(plugin.as_ref(), request, placeholder, instance)
                        .await
                }
                Err(e) => missing_plugin(instance, &e),
            };
            output.items.push(item);
        }

        output.html = output
            .items
            .iter()
            .filter(|i| !i.html.is_empty())
            .map(|i| i.html.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            placeholder = %placeholder,
            items = output.items.len(),
            cached = output.count(ItemOutcome::Cached),
            failed = output.count(ItemOutcome::Failed),
            "placeholder rendered"
        );
        output
    }

    /// Clear cached output after an item is saved.
    pub async fn on_item_saved(&self, item: &ContentItem) -> InvalidationResult<usize> {
        self.invalidate_item(item).await
    }

    /// Clear cached output after an item is deleted.
    pub async fn on_item_deleted(&self, item: &ContentItem) -> InvalidationResult<usize> {
        self.invalidate_item(item).await
    }

    /// Clear every site variant of an item's cached output.
    pub async fn invalidate_item(&self, item: &ContentItem) -> InvalidationResult<usize> {
        let plugin = self.pool.for_item(item)?;
        let cleared = self
            .cache
            .clear(plugin.as_ref(), &item.placeholder, item, self.site_id)
            .await?;
        debug!(item = %item.id, cleared, "item output invalidated");
        Ok(cleared)
    }

    /// Clear cached output of every stored item of a type.
    pub async fn invalidate_plugin(
        &self,
        type_name: &str,
        source: &dyn ItemSource,
    ) -> InvalidationResult<usize> {
        let plugin = self.pool.get(type_name)?;
        let mut instances = plugin.model_instances(source);

        let mut cleared = 0;
        while let Some(item) = instances.next().await {
            let item = item?;
            cleared += self
                .cache
                .clear(plugin.as_ref(), &item.placeholder, &item, self.site_id)
                .await?;
        }

        info!(plugin = %plugin.name(), cleared, "plugin output invalidated");
        Ok(cleared)
    }
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("pool", &self.pool)
            .field("cache_output", &self.cache_output)
            .field("site_id", &self.site_id)
            .finish()
    }
}

/// Host wrapper recording how far a render got.
struct StageHost<'a> {
    inner: &'a dyn RenderHost,
    stage: AtomicU8,
}

impl<'a> StageHost<'a> {
    fn new(inner: &'a dyn RenderHost) -> Self {
        Self {
            inner,
            stage: AtomicU8::new(RenderStage::NotStarted as u8),
        }
    }

    fn reach(&self, stage: RenderStage) {
        self.stage.store(stage as u8, Ordering::Relaxed);
    }

    fn stage(&self) -> RenderStage {
        RenderStage::from_u8(self.stage.load(Ordering::Relaxed))
    }
}

impl RenderHost for StageHost<'_> {
    fn render_to_string(
        &self,
        request: &RenderRequest,
        template: &str,
        context: ContextMap,
    ) -> Result<String, RenderError> {
        self.reach(RenderStage::ContextBuilt);
        self.inner.render_to_string(request, template, context)
    }

    fn translate(&self, request: &RenderRequest, source: &str) -> String {
        self.inner.translate(request, source)
    }
}

fn missing_plugin(instance: &ContentItem, error: &PoolError) -> ItemOutput {
    warn!(error = %error, item = %instance.id, "cannot render content item");
    ItemOutput::new(
        format!("<!-- {} -->", html::escape(&error.to_string())),
        ItemOutcome::MissingPlugin,
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
