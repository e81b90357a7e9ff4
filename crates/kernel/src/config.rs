//! Configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tessera_sdk::types::SiteId;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Site served by this process (default: 1).
    pub site_id: SiteId,

    /// Global switch for output caching (default: true).
    pub cache_output: bool,

    /// Redis connection URL. When None, output is cached in-process only.
    pub redis_url: Option<String>,

    /// Expiry for cached output in seconds; 0 keeps entries until invalidated.
    pub cache_ttl_secs: u64,

    /// PostgreSQL connection URL. When None, in-memory registries are used.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Directory with site templates (`**/*.html`).
    pub template_dir: Option<PathBuf>,

    /// Base URL for static assets (default: /static/).
    pub static_url: String,

    /// Base URL for uploaded media (default: /media/).
    pub media_url: String,

    /// Debug mode, exposed to templates as `debug`.
    pub debug: bool,

    /// Default language code (default: en).
    pub language_code: String,

    /// Available languages as (code, name) pairs.
    pub languages: Vec<(String, String)>,

    /// Which plugins each placeholder accepts.
    pub placeholders: PlaceholderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: SiteId(1),
            cache_output: true,
            redis_url: None,
            cache_ttl_secs: 0,
            database_url: None,
            database_max_connections: 10,
            template_dir: None,
            static_url: "/static/".to_string(),
            media_url: "/media/".to_string(),
            debug: false,
            language_code: "en".to_string(),
            languages: vec![("en".to_string(), "English".to_string())],
            placeholders: PlaceholderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let site_id = env::var("SITE_ID")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map(SiteId)
            .context("SITE_ID must be a valid i64")?;

        let cache_output = parse_bool("TESSERA_CACHE_OUTPUT", true)?;

        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("CACHE_TTL_SECS must be a valid u64")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let template_dir = env::var("TEMPLATE_DIR").ok().map(PathBuf::from);

        let static_url = env::var("STATIC_URL").unwrap_or(defaults.static_url);
        let media_url = env::var("MEDIA_URL").unwrap_or(defaults.media_url);

        let debug = parse_bool("DEBUG", false)?;

        let language_code = env::var("LANGUAGE_CODE").unwrap_or(defaults.language_code);

        let languages = match env::var("LANGUAGES") {
            Ok(v) => parse_languages(&v)?,
            Err(_) => defaults.languages,
        };

        let placeholders = match env::var("PLACEHOLDER_CONFIG") {
            Ok(path) => PlaceholderConfig::load(Path::new(&path))?,
            Err(_) => PlaceholderConfig::default(),
        };

        Ok(Self {
            site_id,
            cache_output,
            redis_url,
            cache_ttl_secs,
            database_url,
            database_max_connections,
            template_dir,
            static_url,
            media_url,
            debug,
            language_code,
            languages,
            placeholders,
        })
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{name} must be a boolean, got '{other}'"),
        },
        Err(_) => Ok(default),
    }
}

/// Parse `code:name` pairs separated by commas, e.g. `en:English,nl:Nederlands`.
fn parse_languages(value: &str) -> Result<Vec<(String, String)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (code, name) = pair
                .split_once(':')
                .with_context(|| format!("LANGUAGES entry '{pair}' must be code:name"))?;
            Ok((code.trim().to_string(), name.trim().to_string()))
        })
        .collect()
}

/// Per-placeholder plugin restrictions, read from TOML:
///
/// ```toml
/// [placeholders.sidebar]
/// plugins = ["TextPlugin", "PicturePlugin"]
/// ```
///
/// Placeholders without an entry accept every registered plugin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceholderConfig {
    #[serde(default)]
    pub placeholders: HashMap<String, PlaceholderSlot>,
}

/// Settings for one placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceholderSlot {
    /// Display title for the placeholder.
    #[serde(default)]
    pub title: Option<String>,

    /// Names of the plugins allowed in this placeholder.
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl PlaceholderConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid placeholder configuration")
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Whether `plugin_name` may render in `placeholder`.
    pub fn allows(&self, placeholder: &str, plugin_name: &str) -> bool {
        match self.placeholders.get(placeholder) {
            Some(slot) => slot.plugins.iter().any(|p| p == plugin_name),
            None => true,
        }
    }
}
