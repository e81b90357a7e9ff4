//! Content collaborators the kernel reads from.
//!
//! This module provides:
//! - ContentTypeRegistry: Maps item type names to persisted entity type ids
//! - SiteRegistry: Enumerates the sites of a multi-site deployment
//! - Item sources: In-memory and PostgreSQL implementations of `ItemSource`

mod item_store;
mod sites;
mod type_registry;

use thiserror::Error;

pub use item_store::{MemoryItems, PgItems};
pub use sites::{PgSites, SiteRegistry, StaticSites};
pub use type_registry::{ContentTypeRegistry, MemoryContentTypes, PgContentTypes};

/// Errors from the content type and site registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A content type was looked up before the registry was ready.
    ///
    /// This points at a startup-ordering bug in the host application and
    /// must reach the caller.
    #[error(
        "unable to resolve content type '{type_name}', is a plugin being registered before the registry is initialized? ({details})"
    )]
    Unavailable { type_name: String, details: String },

    /// The site registry could not be read.
    #[error("unable to list sites: {0}")]
    SitesUnavailable(String),
}

impl RegistryError {
    pub fn unavailable(type_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Unavailable {
            type_name: type_name.into(),
            details: details.into(),
        }
    }
}
