//! Cache key derivation for rendered content items.
//!
//! Keys have the form `contentitem.@{placeholder}.{type}.{id}`. When output
//! is cached per site, the key gets a `-s{site}` suffix.

use tessera_sdk::types::{ContentItem, SiteId};

/// Base cache key for an item rendered in a placeholder.
pub fn derive_key(placeholder: &str, instance: &ContentItem) -> String {
    format!(
        "contentitem.@{placeholder}.{}.{}",
        instance.plugin_type, instance.id
    )
}

/// Site-scoped cache key.
pub fn derive_site_key(placeholder: &str, instance: &ContentItem, site: SiteId) -> String {
    site_suffixed(&derive_key(placeholder, instance), site)
}

fn site_suffixed(base_key: &str, site: SiteId) -> String {
    format!("{base_key}-s{site}")
}

/// Every key an item's output may be stored under.
///
/// Without per-site caching this is the single base key. With it, there is
/// one key per known site, and the current site is added when the site
/// registry does not list it yet. Invalidation clears every returned key,
/// so this list must not miss a variant.
pub fn list_cache_keys(
    placeholder: &str,
    instance: &ContentItem,
    per_site: bool,
    known_sites: &[SiteId],
    current_site: SiteId,
) -> Vec<String> {
    let base_key = derive_key(placeholder, instance);
    if !per_site {
        return vec![base_key];
    }

    let mut sites = known_sites.to_vec();
    if !sites.contains(&current_site) {
        sites.push(current_site);
    }

    sites
        .into_iter()
        .map(|site| site_suffixed(&base_key, site))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item() -> ContentItem {
        let id = Uuid::parse_str("01890a5d-ac96-774b-bcce-b302099a8057").unwrap();
        ContentItem::with_id(id, "PictureItem", "main")
    }

    #[test]
    fn base_key_format() {
        assert_eq!(
            derive_key("main", &item()),
            "contentitem.@main.PictureItem.01890a5d-ac96-774b-bcce-b302099a8057"
        );
    }

    #[test]
    fn derive_key_is_deterministic() {
        let item = item();
        assert_eq!(derive_key("main", &item), derive_key("main", &item));
        assert_eq!(derive_key("main", &item), derive_key("main", &item.clone()));
    }

    #[test]
    fn key_ignores_field_contents() {
        let a = item();
        let b = item().field("caption", "changed");
        assert_eq!(derive_key("main", &a), derive_key("main", &b));
    }

    #[test]
    fn key_differs_per_placeholder_and_item() {
        let a = item();
        let b = ContentItem::new("PictureItem", "main");
        assert_ne!(derive_key("main", &a), derive_key("sidebar", &a));
        assert_ne!(derive_key("main", &a), derive_key("main", &b));
    }

    #[test]
    fn site_key_appends_suffix() {
        let key = derive_site_key("main", &item(), SiteId(3));
        assert_eq!(key, format!("{}-s3", derive_key("main", &item())));
        assert_ne!(key, derive_site_key("main", &item(), SiteId(4)));
    }

    #[test]
    fn without_per_site_only_base_key() {
        let keys = list_cache_keys("main", &item(), false, &[SiteId(1), SiteId(2)], SiteId(1));
        assert_eq!(keys, vec![derive_key("main", &item())]);
    }

    #[test]
    fn per_site_lists_every_known_site() {
        let known = [SiteId(1), SiteId(2), SiteId(3)];
        let keys = list_cache_keys("main", &item(), true, &known, SiteId(2));
        assert_eq!(keys.len(), known.len());
        for site in known {
            assert!(keys.contains(&derive_site_key("main", &item(), site)));
        }
    }

    #[test]
    fn per_site_adds_unregistered_current_site() {
        let known = [SiteId(1), SiteId(2)];
        let keys = list_cache_keys("main", &item(), true, &known, SiteId(9));
        assert_eq!(keys.len(), known.len() + 1);
        assert!(keys.contains(&derive_site_key("main", &item(), SiteId(9))));
    }

    #[test]
    fn per_site_with_empty_registry_still_covers_current_site() {
        let keys = list_cache_keys("main", &item(), true, &[], SiteId(1));
        assert_eq!(keys, vec![derive_site_key("main", &item(), SiteId(1))]);
    }
}
