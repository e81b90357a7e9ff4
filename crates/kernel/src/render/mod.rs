//! Content item rendering.
//!
//! The pipeline resolves each item's plugin, serves cached output when the
//! plugin allows it, and isolates failures so one broken item renders as an
//! error block without affecting the rest of the page.

mod pipeline;

pub use pipeline::{ItemOutcome, ItemOutput, PlaceholderOutput, RenderPipeline, RenderStage};
