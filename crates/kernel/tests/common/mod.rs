#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Builds a real render pipeline over in-memory collaborators. The cache
//! store counts every call so tests can assert on store traffic.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tessera_kernel::cache::{CacheStore, CacheStoreError, MemoryStore, OutputCache};
use tessera_kernel::content::{MemoryContentTypes, StaticSites};
use tessera_kernel::services::Catalog;
use tessera_kernel::theme::{ContextProcessors, ContextSettings, TemplateHost, TeraRenderer};
use tessera_kernel::{Config, PluginPoolBuilder, RenderPipeline};
use tessera_sdk::prelude::*;

/// Sites known to the test site registry.
pub const KNOWN_SITES: [SiteId; 2] = [SiteId(1), SiteId(2)];

/// Memory store that counts calls.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingStore {
    /// Total number of store calls.
    pub fn calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.sets.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Read a key without counting.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(keys).await
    }
}

/// Store whose every operation fails, like an unreachable Redis.
pub struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheStoreError> {
        Err(CacheStoreError::Connection("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::Connection("connection refused".into()))
    }

    async fn delete(&self, _keys: &[String]) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::Connection("connection refused".into()))
    }
}

/// What a [`TestPlugin`] does when asked to render.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Render `<p>{text}</p>`.
    Echo,
    /// Fail with a message containing markup.
    Fail,
    /// Panic.
    Panic,
}

/// Plugin counting its render calls.
pub struct TestPlugin {
    descriptor: &'static PluginDescriptor,
    behavior: Behavior,
    pub renders: Arc<AtomicUsize>,
}

impl TestPlugin {
    pub fn new(descriptor: &'static PluginDescriptor, behavior: Behavior) -> Self {
        Self {
            descriptor,
            behavior,
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared render counter, readable after the plugin moves into the pool.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.renders)
    }
}

impl ContentPlugin for TestPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        self.descriptor
    }

    fn render(
        &self,
        _host: &dyn RenderHost,
        _request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<String, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Echo => Ok(format!("<p>{}</p>", instance.get_str("text"))),
            Behavior::Fail => Err(RenderError::other(
                "bad value <script>alert(1)</script>",
            )),
            Behavior::Panic => panic!("plugin blew up"),
        }
    }
}

/// A pipeline wired to a counting store.
pub struct TestApp {
    pub pipeline: RenderPipeline,
    pub store: Arc<CountingStore>,
}

impl TestApp {
    pub async fn new(plugins: PluginPoolBuilder) -> Self {
        Self::with_config(&Config::default(), plugins).await
    }

    pub async fn with_config(config: &Config, plugins: PluginPoolBuilder) -> Self {
        Self::with_renderer(config, plugins, TeraRenderer::empty()).await
    }

    pub async fn with_renderer(
        config: &Config,
        plugins: PluginPoolBuilder,
        renderer: TeraRenderer,
    ) -> Self {
        let store = Arc::new(CountingStore::default());
        let pipeline = pipeline(config, plugins, renderer, store.clone()).await;
        Self { pipeline, store }
    }
}

/// A pipeline over any store, with [`KNOWN_SITES`] registered.
pub async fn pipeline(
    config: &Config,
    plugins: PluginPoolBuilder,
    mut renderer: TeraRenderer,
    store: Arc<dyn CacheStore>,
) -> RenderPipeline {
    let pool = plugins
        .placeholders(config.placeholders.clone())
        .initialize(&MemoryContentTypes::initialized())
        .await
        .unwrap();
    renderer.register_plugin_templates(&pool).unwrap();

    let cache = OutputCache::new(store, Arc::new(StaticSites::new(KNOWN_SITES)));
    let host = TemplateHost::new(
        Arc::new(renderer),
        ContextProcessors::standard(&ContextSettings::from_config(config)),
        Arc::new(Catalog::with_builtin()),
    );
    RenderPipeline::new(Arc::new(pool), cache, Arc::new(host), config)
}

/// A GET request for a site.
pub fn request_for(site: i64) -> RenderRequest {
    RenderRequest::get("/").site(SiteId(site))
}
