//! Plugin pool - the process-wide registry of content plugins.
//!
//! Plugins are registered on a [`PluginPoolBuilder`] during startup. The
//! builder is then initialized against the content type registry, which
//! resolves every plugin's entity type id, and frozen into a read-only
//! [`PluginPool`] shared by all requests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tessera_sdk::plugin::ContentPlugin;
use tessera_sdk::types::ContentItem;
use tracing::{debug, info};

use super::PoolError;
use crate::config::PlaceholderConfig;
use crate::content::ContentTypeRegistry;

/// Collects plugins before the pool is initialized.
#[derive(Default)]
pub struct PluginPoolBuilder {
    plugins: Vec<Arc<dyn ContentPlugin>>,
    placeholders: PlaceholderConfig,
}

impl PluginPoolBuilder {
    /// Register a plugin.
    ///
    /// Fails when a plugin with the same name, or one rendering the same
    /// item type, is already registered.
    pub fn register<P: ContentPlugin>(self, plugin: P) -> Result<Self, PoolError> {
        self.register_arc(Arc::new(plugin))
    }

    /// Register an already shared plugin.
    pub fn register_arc(mut self, plugin: Arc<dyn ContentPlugin>) -> Result<Self, PoolError> {
        if self
            .plugins
            .iter()
            .any(|p| p.name() == plugin.name() || p.type_name() == plugin.type_name())
        {
            return Err(PoolError::already_registered(
                plugin.name(),
                plugin.type_name(),
            ));
        }

        debug!(plugin = %plugin.name(), type_name = %plugin.type_name(), "plugin registered");
        self.plugins.push(plugin);
        Ok(self)
    }

    /// Restrict which plugins each placeholder accepts.
    pub fn placeholders(mut self, placeholders: PlaceholderConfig) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Plugins registered so far.
    pub fn plugins(&self) -> &[Arc<dyn ContentPlugin>] {
        &self.plugins
    }

    /// Resolve entity type ids and freeze the pool.
    ///
    /// A registry that is not ready fails the whole initialization; the
    /// error is never swallowed.
    pub async fn initialize(
        self,
        registry: &dyn ContentTypeRegistry,
    ) -> Result<PluginPool, PoolError> {
        let mut by_type_id = HashMap::with_capacity(self.plugins.len());
        let mut type_ids = HashMap::with_capacity(self.plugins.len());

        for plugin in &self.plugins {
            let type_id = registry.entity_type_id(plugin.type_name()).await?;
            by_type_id.insert(type_id, Arc::clone(plugin));
            type_ids.insert(plugin.type_name(), type_id);
        }

        info!(count = self.plugins.len(), "plugin pool initialized");

        Ok(PluginPool {
            plugins: self.plugins,
            by_type_id,
            type_ids,
            placeholders: self.placeholders,
        })
    }
}

/// Read-only registry mapping item types to their plugins.
pub struct PluginPool {
    /// Plugins in registration order.
    plugins: Vec<Arc<dyn ContentPlugin>>,
    by_type_id: HashMap<i64, Arc<dyn ContentPlugin>>,
    type_ids: HashMap<&'static str, i64>,
    placeholders: PlaceholderConfig,
}

impl PluginPool {
    pub fn builder() -> PluginPoolBuilder {
        PluginPoolBuilder::default()
    }

    /// All plugins, in registration order.
    pub fn plugins(&self) -> &[Arc<dyn ContentPlugin>] {
        &self.plugins
    }

    /// Look up the plugin for an item type.
    pub fn get(&self, type_name: &str) -> Result<&Arc<dyn ContentPlugin>, PoolError> {
        self.type_ids
            .get(type_name)
            .and_then(|id| self.by_type_id.get(id))
            .ok_or_else(|| PoolError::not_found(type_name))
    }

    /// Look up the plugin that renders an item.
    pub fn for_item(&self, item: &ContentItem) -> Result<&Arc<dyn ContentPlugin>, PoolError> {
        self.get(&item.plugin_type)
    }

    /// Look up a plugin by its persisted entity type id.
    pub fn by_type_id(&self, type_id: i64) -> Option<&Arc<dyn ContentPlugin>> {
        self.by_type_id.get(&type_id)
    }

    /// Entity type id resolved for an item type.
    pub fn type_id(&self, type_name: &str) -> Option<i64> {
        self.type_ids.get(type_name).copied()
    }

    /// Whether a plugin may render in a placeholder.
    pub fn is_allowed(&self, placeholder: &str, plugin: &dyn ContentPlugin) -> bool {
        self.placeholders.allows(placeholder, plugin.name())
    }

    /// Plugins accepted by a placeholder.
    pub fn allowed_plugins(&self, placeholder: &str) -> Vec<Arc<dyn ContentPlugin>> {
        self.plugins
            .iter()
            .filter(|p| self.is_allowed(placeholder, p.as_ref()))
            .cloned()
            .collect()
    }

    /// Plugins grouped by category. Uncategorized plugins are listed under
    /// an empty category name.
    pub fn by_category(&self) -> BTreeMap<&'static str, Vec<Arc<dyn ContentPlugin>>> {
        let mut groups: BTreeMap<&'static str, Vec<Arc<dyn ContentPlugin>>> = BTreeMap::new();
        for plugin in &self.plugins {
            groups
                .entry(plugin.category().unwrap_or_default())
                .or_default()
                .push(Arc::clone(plugin));
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginPool")
            .field("plugins", &self.plugins)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::{MemoryContentTypes, RegistryError};
    use tessera_sdk::plugin::PluginDescriptor;

    static PICTURE: PluginDescriptor =
        PluginDescriptor::new("PicturePlugin", "PictureItem").category("Media");
    static TEXT: PluginDescriptor = PluginDescriptor::new("TextPlugin", "TextItem");
    static OTHER_TEXT: PluginDescriptor = PluginDescriptor::new("OtherTextPlugin", "TextItem");

    struct Fixed(&'static PluginDescriptor);

    impl ContentPlugin for Fixed {
        fn descriptor(&self) -> &PluginDescriptor {
            self.0
        }
    }

    #[tokio::test]
    async fn initialize_resolves_type_ids() {
        let registry = MemoryContentTypes::initialized();
        let pool = PluginPool::builder()
            .register(Fixed(&PICTURE))
            .unwrap()
            .register(Fixed(&TEXT))
            .unwrap()
            .initialize(&registry)
            .await
            .unwrap();

        assert_eq!(pool.len(), 2);
        let picture_id = pool.type_id("PictureItem").unwrap();
        assert_eq!(pool.by_type_id(picture_id).unwrap().name(), "PicturePlugin");
        assert_eq!(pool.get("TextItem").unwrap().name(), "TextPlugin");
    }

    #[tokio::test]
    async fn duplicate_type_is_rejected() {
        let result = PluginPool::builder()
            .register(Fixed(&TEXT))
            .unwrap()
            .register(Fixed(&OTHER_TEXT));

        assert!(matches!(result, Err(PoolError::AlreadyRegistered { .. })));
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let result = PluginPool::builder()
            .register(Fixed(&TEXT))
            .unwrap()
            .register(Fixed(&TEXT));

        assert!(matches!(result, Err(PoolError::AlreadyRegistered { .. })));
    }

    #[tokio::test]
    async fn uninitialized_registry_fails_initialization() {
        let registry = MemoryContentTypes::new();
        let result = PluginPool::builder()
            .register(Fixed(&PICTURE))
            .unwrap()
            .initialize(&registry)
            .await;

        assert!(matches!(
            result,
            Err(PoolError::Registry(RegistryError::Unavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn unknown_type_is_not_found() {
        let registry = MemoryContentTypes::initialized();
        let pool = PluginPool::builder().initialize(&registry).await.unwrap();

        assert!(pool.is_empty());
        assert!(matches!(
            pool.get("MissingItem"),
            Err(PoolError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn placeholder_restrictions_filter_plugins() {
        let placeholders = PlaceholderConfig::from_toml_str(
            r#"
            [placeholders.sidebar]
            plugins = ["TextPlugin"]
            "#,
        )
        .unwrap();

        let registry = MemoryContentTypes::initialized();
        let pool = PluginPool::builder()
            .register(Fixed(&PICTURE))
            .unwrap()
            .register(Fixed(&TEXT))
            .unwrap()
            .placeholders(placeholders)
            .initialize(&registry)
            .await
            .unwrap();

        let sidebar: Vec<_> = pool
            .allowed_plugins("sidebar")
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(sidebar, vec!["TextPlugin"]);
        assert_eq!(pool.allowed_plugins("main").len(), 2);
    }

    #[tokio::test]
    async fn groups_by_category() {
        let registry = MemoryContentTypes::initialized();
        let pool = PluginPool::builder()
            .register(Fixed(&PICTURE))
            .unwrap()
            .register(Fixed(&TEXT))
            .unwrap()
            .initialize(&registry)
            .await
            .unwrap();

        let groups = pool.by_category();
        assert_eq!(groups["Media"].len(), 1);
        assert_eq!(groups[""].len(), 1);
    }
}
