//! Template rendering with Tera.

use std::collections::HashMap;
use std::error::Error as _;
use std::path::Path;

use anyhow::{Context, Result};
use tera::Tera;
use tessera_sdk::error::RenderError;
use tessera_sdk::html;
use tessera_sdk::request::ContextMap;
use tracing::debug;

use crate::plugin::PluginPool;

/// Renders a named template to a string.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with `context` layered over `request_context`.
    /// Keys in `context` win.
    fn render_to_string(
        &self,
        template: &str,
        context: &ContextMap,
        request_context: &ContextMap,
    ) -> Result<String, RenderError>;
}

/// Tera-backed template renderer.
pub struct TeraRenderer {
    /// Tera template engine instance.
    tera: Tera,
}

impl TeraRenderer {
    /// Create a renderer loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Create a renderer with no templates.
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        Self { tera }
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Plain text to paragraphs; escapes its input, so pipe through |safe
        tera.register_filter(
            "linebreaks",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("linebreaks", "value", String, value);
                Ok(tera::Value::String(html::linebreaks(&html::escape(&text))))
            },
        );
    }

    /// Add a template from source.
    pub fn add_raw_template(&mut self, name: &str, source: &str) -> Result<()> {
        self.tera
            .add_raw_template(name, source)
            .with_context(|| format!("failed to parse template '{name}'"))
    }

    /// Add the templates every registered plugin ships with.
    ///
    /// Templates already loaded from the template directory take precedence,
    /// so sites can override plugin templates.
    pub fn register_plugin_templates(&mut self, pool: &PluginPool) -> Result<usize> {
        let mut added = 0;
        for plugin in pool.plugins() {
            for (name, source) in plugin.descriptor().templates {
                if self.has_template(name) {
                    debug!(template = %name, plugin = %plugin.name(), "plugin template overridden by site");
                    continue;
                }
                self.add_raw_template(name, source)
                    .with_context(|| format!("plugin '{}'", plugin.name()))?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Whether a template with this name is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render_to_string(
        &self,
        template: &str,
        context: &ContextMap,
        request_context: &ContextMap,
    ) -> Result<String, RenderError> {
        let mut merged = request_context.clone();
        merged.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));

        let tera_context = tera::Context::from_value(serde_json::Value::Object(merged))
            .map_err(|e| RenderError::template(template, error_chain(&e)))?;

        self.tera
            .render(template, &tera_context)
            .map_err(|e| RenderError::template(template, error_chain(&e)))
    }
}

impl std::fmt::Debug for TeraRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeraRenderer")
            .field("templates", &self.tera.get_template_names().count())
            .finish()
    }
}

/// Tera puts the useful detail in the source chain; flatten it.
fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ContextMap {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn plugin_context_overrides_request_context() {
        let mut renderer = TeraRenderer::empty();
        renderer
            .add_raw_template("t.txt", "{{ title }}|{{ STATIC_URL }}")
            .unwrap();

        let html = renderer
            .render_to_string(
                "t.txt",
                &map(json!({ "title": "Plugin" })),
                &map(json!({ "title": "Request", "STATIC_URL": "/static/" })),
            )
            .unwrap();

        assert_eq!(html, "Plugin|/static/");
    }

    #[test]
    fn html_templates_autoescape() {
        let mut renderer = TeraRenderer::empty();
        renderer.add_raw_template("t.html", "{{ text }}").unwrap();

        let html = renderer
            .render_to_string("t.html", &map(json!({ "text": "<b>" })), &ContextMap::new())
            .unwrap();
        assert_eq!(html, "&lt;b&gt;");
    }

    #[test]
    fn linebreaks_filter_escapes_and_wraps() {
        let mut renderer = TeraRenderer::empty();
        renderer
            .add_raw_template("t.html", "{{ text | linebreaks | safe }}")
            .unwrap();

        let html = renderer
            .render_to_string(
                "t.html",
                &map(json!({ "text": "a <i>\nb" })),
                &ContextMap::new(),
            )
            .unwrap();
        assert_eq!(html, "<p>a &lt;i&gt;<br>b</p>");
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let renderer = TeraRenderer::empty();
        let err = renderer
            .render_to_string("nope.html", &ContextMap::new(), &ContextMap::new())
            .unwrap_err();

        match err {
            RenderError::Template { template, .. } => assert_eq!(template, "nope.html"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_variable_is_a_template_error() {
        let mut renderer = TeraRenderer::empty();
        renderer
            .add_raw_template("t.html", "{{ instance.caption }}")
            .unwrap();

        let err = renderer
            .render_to_string("t.html", &ContextMap::new(), &ContextMap::new())
            .unwrap_err();
        assert!(err.to_string().contains("t.html"));
    }

    #[test]
    fn has_template_checks_loaded_names() {
        let mut renderer = TeraRenderer::empty();
        assert!(!renderer.has_template("t.html"));
        renderer.add_raw_template("t.html", "x").unwrap();
        assert!(renderer.has_template("t.html"));
    }
}
