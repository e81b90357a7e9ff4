//! Picture plugin for Tessera.
//!
//! Renders a `PictureItem` as a figure with an optional caption and link.
//! Output is cached per site, since links may point to site-specific pages.

use serde::Deserialize;
use serde_json::json;
use tessera_sdk::prelude::*;

/// Template name registered by this plugin.
pub const TEMPLATE: &str = "picture/default.html";

static DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("PicturePlugin", "PictureItem")
    .verbose_name("Picture")
    .category("Media")
    .render_template(TEMPLATE)
    .cache_output_per_site(true)
    .templates(&[(TEMPLATE, include_str!("../templates/picture/default.html"))]);

/// Horizontal placement of a picture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Align {
    /// CSS class applied to the figure.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Left => "align-left",
            Self::Center => "align-center",
            Self::Right => "align-right",
        }
    }
}

/// Typed view of a picture item's fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PictureFields {
    pub image: String,
    pub caption: String,
    pub align: Align,
    pub url: Option<String>,
}

impl PictureFields {
    fn from_item(instance: &ContentItem) -> Result<Self, RenderError> {
        let value = serde_json::to_value(&instance.fields)?;
        let fields: Self = serde_json::from_value(value)?;
        if fields.image.trim().is_empty() {
            return Err(RenderError::Context(format!(
                "picture {} has no image",
                instance.id
            )));
        }
        Ok(fields)
    }
}

/// Picture content plugin.
#[derive(Debug, Default)]
pub struct PicturePlugin;

impl ContentPlugin for PicturePlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &DESCRIPTOR
    }

    fn get_context(
        &self,
        _request: &RenderRequest,
        instance: &ContentItem,
    ) -> Result<ContextMap, RenderError> {
        let fields = PictureFields::from_item(instance)?;

        let mut context = ContextMap::new();
        context.insert("instance".to_string(), serde_json::to_value(instance)?);
        context.insert("image".to_string(), json!(fields.image));
        context.insert("caption".to_string(), json!(fields.caption));
        context.insert("align_class".to_string(), json!(fields.align.css_class()));
        context.insert("url".to_string(), json!(fields.url.unwrap_or_default()));
        Ok(context)
    }
}
