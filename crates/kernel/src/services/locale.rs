//! Interface string translation.
//!
//! Holds translations in an in-memory map and backs the `translate()` calls
//! plugins make through the render host.

use dashmap::DashMap;
use tessera_sdk::plugin::{ERROR_LABEL, NO_RENDERING_DEFINED};

/// Translations shipped with the kernel.
const BUILTIN: &[(&str, &str, &str)] = &[
    ("nl", ERROR_LABEL, "Fout:"),
    (
        "nl",
        NO_RENDERING_DEFINED,
        "{Geen weergave gedefinieerd voor plugin '%s'}",
    ),
    ("de", ERROR_LABEL, "Fehler:"),
    (
        "de",
        NO_RENDERING_DEFINED,
        "{Keine Darstellung definiert für Plugin '%s'}",
    ),
];

/// Translation catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    /// key = "language\0source" → translation.
    entries: DashMap<String, String>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in kernel translations.
    pub fn with_builtin() -> Self {
        let catalog = Self::new();
        for (language, source, translation) in BUILTIN {
            catalog.insert(language, source, translation);
        }
        catalog
    }

    /// Add or replace one translation.
    pub fn insert(&self, language: &str, source: &str, translation: &str) {
        self.entries
            .insert(cache_key(language, source), translation.to_string());
    }

    /// Translate a source string.
    ///
    /// Tries the full language code, then its primary subtag ("pt" for
    /// "pt-br"), and falls back to the source string.
    pub fn translate(&self, source: &str, language: &str) -> String {
        if let Some(translation) = self.entries.get(&cache_key(language, source)) {
            return translation.clone();
        }

        if let Some((primary, _)) = language.split_once('-')
            && let Some(translation) = self.entries.get(&cache_key(primary, source))
        {
            return translation.clone();
        }

        source.to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a map key from language and source.
///
/// Uses a null byte separator so sources containing other separators
/// cannot collide.
fn cache_key(language: &str, source: &str) -> String {
    format!("{language}\0{source}")
}
