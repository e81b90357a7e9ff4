//! Item sources: read access to persisted content items.

use std::collections::HashMap;

use async_stream::try_stream;
use dashmap::DashMap;
use futures_core::Stream;
use sqlx::PgPool;
use tessera_sdk::error::SourceError;
use tessera_sdk::plugin::{ItemSource, ItemStream};
use tessera_sdk::types::ContentItem;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Items held in memory, keyed by id.
#[derive(Debug, Default)]
pub struct MemoryItems {
    items: DashMap<Uuid, ContentItem>,
}

impl MemoryItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn insert(&self, item: ContentItem) {
        self.items.insert(item.id, item);
    }

    /// Remove an item, returning it when present.
    pub fn remove(&self, id: Uuid) -> Option<ContentItem> {
        self.items.remove(&id).map(|(_, item)| item)
    }

    pub fn get(&self, id: Uuid) -> Option<ContentItem> {
        self.items.get(&id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ContentItem> for MemoryItems {
    fn from_iter<I: IntoIterator<Item = ContentItem>>(iter: I) -> Self {
        let items = Self::new();
        for item in iter {
            items.insert(item);
        }
        items
    }
}

impl ItemSource for MemoryItems {
    fn items_of_type<'a>(&'a self, type_name: &'a str) -> ItemStream<'a> {
        // Snapshot first so no map guard is held across the stream's lifetime
        let matching: Vec<_> = self
            .items
            .iter()
            .filter(|r| r.plugin_type == type_name)
            .map(|r| Ok(r.value().clone()))
            .collect();

        Box::pin(tokio_stream::iter(matching))
    }
}

/// Items stored in the `content_item` table.
#[derive(Debug, Clone)]
pub struct PgItems {
    pool: PgPool,
}

/// Raw `content_item` row.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    plugin_type: String,
    placeholder: String,
    language: String,
    sort_order: i32,
    fields: serde_json::Value,
}

impl ItemRow {
    fn into_item(self) -> Result<ContentItem, SourceError> {
        let fields: HashMap<String, serde_json::Value> = serde_json::from_value(self.fields)
            .map_err(|e| SourceError::Decode {
                id: self.id,
                details: format!("fields must be a JSON object: {e}"),
            })?;

        Ok(ContentItem {
            id: self.id,
            plugin_type: self.plugin_type,
            placeholder: self.placeholder,
            language: self.language,
            sort_order: self.sort_order,
            fields,
        })
    }
}

const SELECT_ITEMS: &str = "SELECT id, plugin_type, placeholder, language, sort_order, fields FROM content_item";

impl PgItems {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a single item.
    pub async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, SourceError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        row.map(ItemRow::into_item).transpose()
    }

    fn stream_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Stream<Item = Result<ContentItem, SourceError>> + Send + 'a {
        try_stream! {
            let query = format!("{SELECT_ITEMS} WHERE plugin_type = $1 ORDER BY placeholder, sort_order");
            let mut rows = sqlx::query_as::<_, ItemRow>(&query)
                .bind(type_name)
                .fetch(&self.pool);

            while let Some(row) = rows.next().await {
                let row = row.map_err(|e| SourceError::Unavailable(e.to_string()))?;
                yield row.into_item()?;
            }
        }
    }
}

impl ItemSource for PgItems {
    fn items_of_type<'a>(&'a self, type_name: &'a str) -> ItemStream<'a> {
        Box::pin(self.stream_type(type_name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_items_filter_by_type() {
        let items: MemoryItems = [
            ContentItem::new("PictureItem", "main"),
            ContentItem::new("TextItem", "main"),
            ContentItem::new("PictureItem", "sidebar"),
        ]
        .into_iter()
        .collect();

        let mut stream = items.items_of_type("PictureItem");
        let mut found = Vec::new();
        while let Some(item) = stream.next().await {
            found.push(item.unwrap());
        }

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|i| i.plugin_type == "PictureItem"));
    }

    #[tokio::test]
    async fn memory_items_insert_and_remove() {
        let items = MemoryItems::new();
        let item = ContentItem::new("TextItem", "main");
        let id = item.id;

        items.insert(item.clone());
        assert_eq!(items.get(id), Some(item));

        assert!(items.remove(id).is_some());
        assert!(items.is_empty());
    }

    #[test]
    fn row_with_non_object_fields_fails_to_decode() {
        let row = ItemRow {
            id: Uuid::nil(),
            plugin_type: "TextItem".into(),
            placeholder: "main".into(),
            language: "en".into(),
            sort_order: 0,
            fields: serde_json::json!([1, 2, 3]),
        };
        assert!(matches!(
            row.into_item(),
            Err(SourceError::Decode { .. })
        ));
    }
}
