//! Tessera kernel library.
//!
//! Renders content items through their plugins, caches the output per item
//! (optionally per site) and clears it again when items change. The
//! `tessera` binary in the CLI crate drives it from the command line.

pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod plugin;
pub mod render;
pub mod services;
pub mod state;
pub mod theme;

pub use config::Config;
pub use error::{InvalidationError, InvalidationResult};
pub use plugin::{PluginPool, PluginPoolBuilder, PoolError};
pub use render::{ItemOutcome, ItemOutput, PlaceholderOutput, RenderPipeline};
pub use state::AppState;
