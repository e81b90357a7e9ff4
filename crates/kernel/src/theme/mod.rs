//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering, the standard request context
//! and the render host plugins call back into.

mod context;
mod engine;
mod host;

pub use context::{ContextProcessor, ContextProcessors, ContextSettings};
pub use engine::{TemplateRenderer, TeraRenderer};
pub use host::TemplateHost;
