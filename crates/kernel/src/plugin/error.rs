//! Plugin pool error types with clear, actionable messages.

use thiserror::Error;

use crate::content::RegistryError;

/// Errors from registering or looking up plugins.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A plugin with the same name or item type is already registered.
    #[error("plugin '{plugin}': already registered for item type '{type_name}'")]
    AlreadyRegistered { plugin: String, type_name: String },

    /// No plugin renders the requested item type.
    #[error("no plugin registered for item type '{type_name}'")]
    NotFound { type_name: String },

    /// The content type registry could not resolve a plugin's type.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PoolError {
    /// Create an already-registered error.
    pub fn already_registered(plugin: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            plugin: plugin.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(type_name: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
        }
    }
}
