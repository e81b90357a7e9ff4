//! Tessera Plugin SDK
//!
//! Types and traits for Tessera content plugins. Plugin crates depend on
//! this crate, implement [`ContentPlugin`](plugin::ContentPlugin) for their
//! item type, and hand the plugin to the kernel's plugin pool at startup.

pub mod error;
pub mod html;
pub mod plugin;
pub mod request;
pub mod types;

pub mod prelude {
    pub use crate::error::{RenderError, SourceError};
    pub use crate::plugin::{
        ContentPlugin, ItemSource, ItemStream, PluginDescriptor, RenderHost,
    };
    pub use crate::request::{ContextMap, FlashMessage, MessageLevel, RenderRequest, UserIdentity};
    pub use crate::types::{ContentItem, SiteId, TextValue};
}
