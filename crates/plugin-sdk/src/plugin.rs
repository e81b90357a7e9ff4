//! The content plugin contract.
//!
//! A plugin defines how one content item type is rendered. Each plugin is
//! registered with the kernel's plugin pool once at startup and then shared
//! across every request, so plugin values carry no per-request state: all
//! request data arrives through method arguments.
//!
//! Minimal plugin:
//!
//! ```
//! use tessera_sdk::prelude::*;
//!
//! struct AnnouncementPlugin;
//!
//! static ANNOUNCEMENT: PluginDescriptor = PluginDescriptor::new("AnnouncementPlugin", "AnnouncementItem")
//!     .render_template("announcement/default.html")
//!     .category("Simple blocks");
//!
//! impl ContentPlugin for AnnouncementPlugin {
//!     fn descriptor(&self) -> &PluginDescriptor {
//!         &ANNOUNCEMENT
//!     }
//! }
//! ```

use std::pin::Pin;

use futures_core::Stream;

use crate::error::{RenderError, SourceError};
use crate::html;
use crate::request::{ContextMap, RenderRequest};
use crate::types::ContentItem;

/// Message rendered when a plugin has no template for an item.
///
/// `%s` is replaced with the plugin name after translation.
pub const NO_RENDERING_DEFINED: &str = "{No rendering defined for plugin '%s'}";

/// Label shown at the top of an error block.
pub const ERROR_LABEL: &str = "Error:";

/// Static metadata for one plugin.
///
/// Descriptors are meant to live in `static`s and are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Plugin name (e.g. "PicturePlugin").
    pub name: &'static str,
    /// Type name of the content item the plugin renders (e.g. "PictureItem").
    pub type_name: &'static str,
    /// Human-readable title for the plugin.
    pub verbose_name: &'static str,
    /// Template used by the default [`ContentPlugin::get_render_template`].
    pub render_template: Option<&'static str>,
    /// Whether rendered output is cached.
    pub cache_output: bool,
    /// Whether cached output is further scoped per site.
    pub cache_output_per_site: bool,
    /// Category the plugin is listed under.
    pub category: Option<&'static str>,
    /// Templates shipped with the plugin, as `(name, source)` pairs.
    pub templates: &'static [(&'static str, &'static str)],
}

impl PluginDescriptor {
    /// Create a descriptor with caching enabled and no template.
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            verbose_name: type_name,
            render_template: None,
            cache_output: true,
            cache_output_per_site: false,
            category: None,
            templates: &[],
        }
    }

    pub const fn verbose_name(mut self, verbose_name: &'static str) -> Self {
        self.verbose_name = verbose_name;
        self
    }

    pub const fn render_template(mut self, template: &'static str) -> Self {
        self.render_template = Some(template);
        self
    }

    pub const fn cache_output(mut self, enabled: bool) -> Self {
        self.cache_output = enabled;
        self
    }

    pub const fn cache_output_per_site(mut self, enabled: bool) -> Self {
        self.cache_output_per_site = enabled;
        self
    }

    pub const fn category(mut self, category: &'static str) -> Self {
        self.category = Some(category);
        self
    }

    pub const fn templates(mut self, templates: &'static [(&'static str, &'static str)]) -> Self {
        self.templates = templates;
        self
    }
}

/// Rendering services the kernel provides to plugins.
pub trait RenderHost: Send + Sync {
    /// Render a template with the plugin context layered over the
    /// standard request context.
    fn render_to_string(
        &self,
        request: &RenderRequest,
        template: &str,
        context: ContextMap,
    ) -> Result<String, RenderError>;

    /// Translate an interface string into the request language.
    fn translate(&self, request: &RenderRequest, source: &str) -> String;
}

/// Lazy stream of content items.
pub type ItemStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ContentItem, SourceError>> + Send + 'a>>;

/// Read access to persisted content items.
pub trait ItemSource: Send + Sync {
    /// Stream every stored item of the given type.
    fn items_of_type<'a>(&'a self, type_name: &'a str) -> ItemStream<'a>;
}

/// The interface every content plugin implements.
///
/// Only [`descriptor`](Self::descriptor) is required. Plugins override the
/// other methods to pick templates per item, add context variables, or take
/// over rendering entirely. Caching is handled by the kernel around
/// [`render`](Self::render); plugins never read or write the cache.
pub trait ContentPlugin: Send + Sync + 'static {
    /// Static metadata for this plugin.
    fn descriptor(&self) -> &PluginDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Type name of the bound content item.
    fn type_name(&self) -> &'static str {
        self.descriptor().type_name
    }

    fn verbose_name(&self) -> &'static str {
        self.descriptor().verbose_name
    }

    fn category(&self) -> Option<&'static str> {
        self.descriptor().category
    }

    fn cache_output(&self) -> bool {
        self.descriptor().cache_output
    }

    fn cache_output_per_site(&self) -> bool {
        self.descriptor().cache_output_per_site
    }

    /// Select the template for an item. `None` means the item has no
    /// rendering.
    fn get_render_template(
        &self,
        _request: &RenderRequest,
        _instance: &ContentItem,
    ) -> Result<Option<String>, RenderError> {
        Ok(self.descriptor().render_template.map(str::to_string))
    }

    /// Build the template context. The default exposes the item as
    /// `instance`.
    fn get_context(
        &self,
        _request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<ContextMap, RenderError> {
        let mut context = ContextMap::new();
        context.insert("instance".to_string(), serde_json::to_value(instance)?);
        Ok(context)
    }

    /// Render an item to markup.
    fn render(
        &self,
        host: &dyn RenderHost,
        request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<String, RenderError> {
        let Some(template) = self.get_render_template(request, instance)? else {
            return Ok(host
                .translate(request, NO_RENDERING_DEFINED)
                .replace("%s", self.name()));
        };

        let context = self.get_context(request, instance)?;
        host.render_to_string(request, &template, context)
    }

    /// Render a failure as an inline error block.
    fn render_error(
        &self,
        host: &dyn RenderHost,
        request: &RenderRequest,
        error: &RenderError,
    ) -> String {
        html::error_block(&host.translate(request, ERROR_LABEL), &error.to_string())
    }

    /// Every stored instance of this plugin's item type.
    fn model_instances<'a>(&self, source: &'a dyn ItemSource) -> ItemStream<'a> {
        source.items_of_type(self.type_name())
    }
}

impl std::fmt::Debug for dyn ContentPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} for {} items>", self.name(), self.type_name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    static PLAIN: PluginDescriptor = PluginDescriptor::new("PlainPlugin", "PlainItem");

    static TEMPLATED: PluginDescriptor = PluginDescriptor::new("QuotePlugin", "QuoteItem")
        .verbose_name("Quote")
        .render_template("quote/default.html")
        .cache_output_per_site(true)
        .category("Text");

    struct Plain;

    impl ContentPlugin for Plain {
        fn descriptor(&self) -> &PluginDescriptor {
            &PLAIN
        }
    }

    struct Quote;

    impl ContentPlugin for Quote {
        fn descriptor(&self) -> &PluginDescriptor {
            &TEMPLATED
        }
    }

    /// Host that echoes the template name and context keys.
    struct EchoHost;

    impl RenderHost for EchoHost {
        fn render_to_string(
            &self,
            _request: &RenderRequest,
            template: &str,
            context: ContextMap,
        ) -> Result<String, RenderError> {
            let mut keys: Vec<_> = context.keys().cloned().collect();
            keys.sort();
            Ok(format!("{template}:{}", keys.join(",")))
        }

        fn translate(&self, request: &RenderRequest, source: &str) -> String {
            if request.language == "nl" && source == ERROR_LABEL {
                return "Fout:".to_string();
            }
            source.to_string()
        }
    }

    #[test]
    fn descriptor_defaults() {
        assert!(PLAIN.cache_output);
        assert!(!PLAIN.cache_output_per_site);
        assert_eq!(PLAIN.verbose_name, "PlainItem");
        assert!(PLAIN.render_template.is_none());
        assert!(PLAIN.templates.is_empty());
    }

    #[test]
    fn accessors_read_descriptor() {
        let quote = Quote;
        assert_eq!(quote.name(), "QuotePlugin");
        assert_eq!(quote.type_name(), "QuoteItem");
        assert_eq!(quote.verbose_name(), "Quote");
        assert_eq!(quote.category(), Some("Text"));
        assert!(quote.cache_output_per_site());
    }

    #[test]
    fn default_context_contains_instance() {
        let item = ContentItem::new("QuoteItem", "main").field("text", "hi");
        let context = Quote.get_context(&RenderRequest::default(), &item).unwrap();
        assert_eq!(context.len(), 1);
        assert_eq!(context["instance"]["fields"]["text"], "hi");
    }

    #[test]
    fn render_uses_template_and_context() {
        let item = ContentItem::new("QuoteItem", "main");
        let html = Quote
            .render(&EchoHost, &RenderRequest::default(), &item)
            .unwrap();
        assert_eq!(html, "quote/default.html:instance");
    }

    #[test]
    fn render_without_template_returns_message() {
        let item = ContentItem::new("PlainItem", "main");
        let html = Plain
            .render(&EchoHost, &RenderRequest::default(), &item)
            .unwrap();
        assert_eq!(html, "{No rendering defined for plugin 'PlainPlugin'}");
    }

    #[test]
    fn render_error_is_translated_and_escaped() {
        let request = RenderRequest::default().language("nl");
        let err = RenderError::other("<b>boom</b>");
        let html = Plain.render_error(&EchoHost, &request, &err);
        assert!(html.contains("<strong>Fout:</strong>"));
        assert!(html.contains("&lt;b&gt;boom&lt;/b&gt;"));
    }

    #[test]
    fn debug_shows_plugin_and_type() {
        let plugin: Box<dyn ContentPlugin> = Box::new(Quote);
        assert_eq!(format!("{plugin:?}"), "<QuotePlugin for QuoteItem items>");
    }
}
