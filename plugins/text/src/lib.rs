//! Text plugin for Tessera.
//!
//! Renders a `TextItem` without a template. Filtered HTML is sanitized with
//! ammonia; plain text is escaped and split into paragraphs.

use tessera_sdk::html;
use tessera_sdk::prelude::*;

static DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("TextPlugin", "TextItem")
    .verbose_name("Text")
    .category("Standard content");

/// Rich text content plugin.
#[derive(Debug, Default)]
pub struct TextPlugin;

impl TextPlugin {
    /// Markup for a text value, by format.
    pub fn body(value: &TextValue) -> String {
        match value.format.as_str() {
            "filtered_html" | "full_html" => ammonia::clean(&value.value),
            _ => html::linebreaks(&html::escape(&value.value)),
        }
    }
}

impl ContentPlugin for TextPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &DESCRIPTOR
    }

    fn render(
        &self,
        _host: &dyn RenderHost,
        _request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<String, RenderError> {
        // Accept both {"value", "format"} objects and bare strings
        let value = match instance.get_text_value("text") {
            Some(value) => value,
            None => match instance.get_field::<String>("text") {
                Some(text) => TextValue::html(text),
                None => {
                    return Err(RenderError::Context(format!(
                        "text item {} has no text",
                        instance.id
                    )));
                }
            },
        };

        Ok(format!("<div class=\"text\">{}</div>", Self::body(&value)))
    }
}
