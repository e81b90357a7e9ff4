//! Application state shared by every render.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tessera_sdk::plugin::ItemSource;
use tracing::info;

use crate::cache::{self, CacheStore, OutputCache};
use crate::config::Config;
use crate::content::{
    ContentTypeRegistry, MemoryContentTypes, MemoryItems, PgContentTypes, PgItems, PgSites,
    SiteRegistry, StaticSites,
};
use crate::db;
use crate::plugin::{PluginPool, PluginPoolBuilder};
use crate::render::RenderPipeline;
use crate::services::Catalog;
use crate::theme::{ContextProcessors, ContextSettings, TemplateHost, TeraRenderer};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration the state was built from.
    config: Config,

    /// PostgreSQL connection pool, when `DATABASE_URL` is set.
    db: Option<PgPool>,

    /// Output cache backend.
    store: Arc<dyn CacheStore>,

    /// Persisted content items.
    items: Arc<dyn ItemSource>,

    /// Interface translations.
    catalog: Arc<Catalog>,

    /// Render pipeline over the frozen plugin pool.
    pipeline: RenderPipeline,
}

impl AppState {
    /// Build the state: connect collaborators, initialize the plugin pool
    /// and load templates.
    pub async fn new(config: &Config, plugins: PluginPoolBuilder) -> Result<Self> {
        let (db, types, sites, items): (
            Option<PgPool>,
            Arc<dyn ContentTypeRegistry>,
            Arc<dyn SiteRegistry>,
            Arc<dyn ItemSource>,
        ) = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;
                db::install_schema(&pool).await?;
                (
                    Some(pool.clone()),
                    Arc::new(PgContentTypes::new(pool.clone())),
                    Arc::new(PgSites::new(pool.clone())),
                    Arc::new(PgItems::new(pool)),
                )
            }
            None => {
                info!("no DATABASE_URL, using in-memory content registries");
                (
                    None,
                    Arc::new(MemoryContentTypes::initialized()),
                    Arc::new(StaticSites::new([config.site_id])),
                    Arc::new(MemoryItems::new()),
                )
            }
        };

        Self::with_collaborators(config, plugins, db, types, sites, items).await
    }

    /// Build the state from explicit collaborators.
    pub async fn with_collaborators(
        config: &Config,
        plugins: PluginPoolBuilder,
        db: Option<PgPool>,
        types: Arc<dyn ContentTypeRegistry>,
        sites: Arc<dyn SiteRegistry>,
        items: Arc<dyn ItemSource>,
    ) -> Result<Self> {
        let store = cache::build_store(config)?;

        let pool = plugins
            .placeholders(config.placeholders.clone())
            .initialize(types.as_ref())
            .await
            .context("failed to initialize plugin pool")?;

        let mut renderer = match &config.template_dir {
            Some(dir) => TeraRenderer::new(dir)?,
            None => TeraRenderer::empty(),
        };
        let added = renderer.register_plugin_templates(&pool)?;
        info!(plugins = pool.len(), templates = added, "plugins loaded");

        let catalog = Arc::new(Catalog::with_builtin());
        let host = TemplateHost::new(
            Arc::new(renderer),
            ContextProcessors::standard(&ContextSettings::from_config(config)),
            Arc::clone(&catalog),
        );

        let pipeline = RenderPipeline::new(
            Arc::new(pool),
            OutputCache::new(Arc::clone(&store), sites),
            Arc::new(host),
            config,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config: config.clone(),
                db,
                store,
                items,
                catalog,
                pipeline,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool, if one is configured.
    pub fn db(&self) -> Option<&PgPool> {
        self.inner.db.as_ref()
    }

    /// Get the output cache backend.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.inner.store
    }

    /// Get the persisted item source.
    pub fn items(&self) -> &Arc<dyn ItemSource> {
        &self.inner.items
    }

    /// Get the translation catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.inner.catalog
    }

    /// Get the render pipeline.
    pub fn pipeline(&self) -> &RenderPipeline {
        &self.inner.pipeline
    }

    /// Get the plugin pool.
    pub fn plugins(&self) -> &PluginPool {
        self.inner.pipeline.pool()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("pipeline", &self.inner.pipeline)
            .finish()
    }
}
