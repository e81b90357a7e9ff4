//! Core types shared between content plugins and the kernel.
//!
//! Content items are owned by the host persistence layer. Plugins and the
//! kernel only ever read them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default language code for items that do not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A content item: one typed unit of content placed in a placeholder.
///
/// Type-specific data lives in `fields` as JSON, so every plugin can share
/// the same record shape while still declaring its own field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier (UUIDv7, time-sortable).
    pub id: Uuid,

    /// Type name of the plugin that renders this item (e.g. "PictureItem").
    pub plugin_type: String,

    /// Name of the placeholder slot the item is placed in.
    pub placeholder: String,

    /// Language code of the item.
    #[serde(default = "default_language")]
    pub language: String,

    /// Position within the placeholder (lower renders first).
    #[serde(default)]
    pub sort_order: i32,

    /// Dynamic fields as key-value pairs.
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl ContentItem {
    /// Create a new, empty item with a fresh identifier.
    pub fn new(plugin_type: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::with_id(Uuid::now_v7(), plugin_type, placeholder)
    }

    /// Create an item with a known identifier.
    pub fn with_id(
        id: Uuid,
        plugin_type: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            id,
            plugin_type: plugin_type.into(),
            placeholder: placeholder.into(),
            language: default_language(),
            sort_order: 0,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn field<T: Serialize>(mut self, name: &str, value: T) -> Self {
        self.set_field(name, value);
        self
    }

    /// Builder-style sort order setter.
    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Get a field value as a specific type.
    pub fn get_field<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Option<T> {
        self.fields
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a field value.
    pub fn set_field<T: Serialize>(&mut self, name: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(name.to_string(), v);
        }
    }

    /// Get a plain string field, or an empty string when unset.
    pub fn get_str(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Get a text field with format info.
    pub fn get_text_value(&self, name: &str) -> Option<TextValue> {
        self.get_field(name)
    }
}

/// A text field value with its format (e.g., "filtered_html", "plain_text").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
    pub format: String,
}

impl TextValue {
    pub fn new(value: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: format.into(),
        }
    }

    /// Create plain text value.
    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, "plain_text")
    }

    /// Create filtered HTML value.
    pub fn html(value: impl Into<String>) -> Self {
        Self::new(value, "filtered_html")
    }
}

/// Identifier of one deployment tenant in a multi-site setup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SiteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn item_fields_roundtrip_through_json() {
        let item = ContentItem::new("PictureItem", "main")
            .field("caption", "A harbour at dawn")
            .field("width", 640)
            .sort_order(3);

        let json = serde_json::to_string(&item).unwrap();
        let back: ContentItem = serde_json::from_str(&json).unwrap();

        assert_eq!(back, item);
        assert_eq!(back.get_str("caption"), "A harbour at dawn");
        assert_eq!(back.get_field::<u32>("width"), Some(640));
    }

    #[test]
    fn missing_fields_default_on_deserialize() {
        let json = r#"{
            "id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "plugin_type": "TextItem",
            "placeholder": "sidebar"
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.language, "en");
        assert_eq!(item.sort_order, 0);
        assert!(item.fields.is_empty());
        assert_eq!(item.get_str("text"), "");
    }

    #[test]
    fn text_value_reads_from_item() {
        let item =
            ContentItem::new("TextItem", "main").field("text", TextValue::html("<p>Hi</p>"));
        let text = item.get_text_value("text").unwrap();
        assert_eq!(text.format, "filtered_html");
        assert_eq!(text.value, "<p>Hi</p>");
    }

    #[test]
    fn site_id_is_transparent_in_json() {
        assert_eq!(serde_json::to_string(&SiteId(3)).unwrap(), "3");
        assert_eq!(SiteId(3).to_string(), "3");
    }
}
