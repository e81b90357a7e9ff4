//! Command implementations.
//!
//! Each command works on a fully initialized [`AppState`]; item files hold a
//! JSON array of content items.

use std::path::Path;

use anyhow::{Context, Result};
use tessera_kernel::content::MemoryItems;
use tessera_kernel::{AppState, ItemOutcome};
use tessera_sdk::plugin::ItemSource;
use tessera_sdk::request::RenderRequest;
use tessera_sdk::types::{ContentItem, SiteId};
use tracing::info;

/// Read content items from a JSON file.
pub fn load_items(path: &Path) -> Result<Vec<ContentItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} must hold a JSON array of content items", path.display()))
}

/// Render the items of one placeholder and print the markup.
pub async fn cmd_render(
    state: &AppState,
    items_path: &Path,
    placeholder: &str,
    site: Option<i64>,
    language: Option<String>,
    show_outcomes: bool,
) -> Result<()> {
    let items: Vec<ContentItem> = load_items(items_path)?
        .into_iter()
        .filter(|item| item.placeholder == placeholder)
        .collect();

    let mut request = RenderRequest::get("/");
    if let Some(site) = site {
        request = request.site(SiteId(site));
    }
    if let Some(language) = language {
        request = request.language(language);
    }

    let output = state
        .pipeline()
        .render_placeholder(&request, placeholder, &items)
        .await;

    println!("{}", output.html);

    if show_outcomes {
        eprintln!("{:<38} {:<14}", "ITEM", "OUTCOME");
        eprintln!("{}", "-".repeat(52));
        let mut ordered: Vec<&ContentItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.sort_order);
        for (item, result) in ordered.iter().zip(&output.items) {
            eprintln!("{:<38} {:?}", item.id, result.outcome);
        }
    }

    if output.count(ItemOutcome::Failed) > 0 {
        info!(
            failed = output.count(ItemOutcome::Failed),
            "some items rendered as errors"
        );
    }
    Ok(())
}

/// Print every cache key each item's output may be stored under.
pub async fn cmd_cache_keys(state: &AppState, items_path: &Path) -> Result<()> {
    let pipeline = state.pipeline();
    let current_site = state.config().site_id;

    for item in load_items(items_path)? {
        let plugin = pipeline.pool().for_item(&item)?;
        let keys = pipeline
            .cache()
            .cache_keys(plugin.as_ref(), &item.placeholder, &item, current_site)
            .await?;
        for key in keys {
            println!("{key}");
        }
    }
    Ok(())
}

/// Clear cached output for the items in a file, or for every item of a type.
pub async fn cmd_clear(
    state: &AppState,
    items_path: Option<&Path>,
    type_name: Option<&str>,
) -> Result<()> {
    let file_items = items_path.map(load_items).transpose()?;

    let cleared = match (type_name, file_items) {
        (Some(type_name), Some(items)) => {
            let source: MemoryItems = items.into_iter().collect();
            state
                .pipeline()
                .invalidate_plugin(type_name, &source)
                .await?
        }
        (Some(type_name), None) => {
            let source: &dyn ItemSource = state.items().as_ref();
            state.pipeline().invalidate_plugin(type_name, source).await?
        }
        (None, Some(items)) => {
            let mut cleared = 0;
            for item in &items {
                cleared += state.pipeline().invalidate_item(item).await?;
            }
            cleared
        }
        (None, None) => anyhow::bail!("pass --items, --type, or both"),
    };

    println!("Cleared {cleared} cache keys.");
    Ok(())
}

/// List registered plugins by category.
pub fn cmd_plugins(state: &AppState) {
    let pool = state.plugins();
    println!(
        "{:<20} {:<20} {:<16} {:<8} {:<8}",
        "CATEGORY", "PLUGIN", "ITEM TYPE", "CACHED", "PER-SITE"
    );
    println!("{}", "-".repeat(76));

    for (category, plugins) in pool.by_category() {
        for plugin in plugins {
            println!(
                "{:<20} {:<20} {:<16} {:<8} {:<8}",
                if category.is_empty() { "-" } else { category },
                plugin.name(),
                plugin.type_name(),
                if plugin.cache_output() { "yes" } else { "no" },
                if plugin.cache_output_per_site() { "yes" } else { "no" },
            );
        }
    }
}
