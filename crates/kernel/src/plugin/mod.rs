//! Plugin registration for Tessera.
//!
//! This module handles:
//! - Registering content plugins once at startup
//! - Resolving each plugin's entity type id through the content type registry
//! - Looking plugins up by item type, entity type id, or placeholder

mod error;
mod pool;

pub use error::PoolError;
pub use pool::{PluginPool, PluginPoolBuilder};
