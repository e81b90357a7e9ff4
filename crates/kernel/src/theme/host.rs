//! The render host handed to plugins.

use std::sync::Arc;

use tessera_sdk::error::RenderError;
use tessera_sdk::plugin::RenderHost;
use tessera_sdk::request::{ContextMap, RenderRequest};

use super::context::ContextProcessors;
use super::engine::TemplateRenderer;
use crate::services::Catalog;

/// Renders plugin templates with the standard request context underneath.
#[derive(Clone)]
pub struct TemplateHost {
    renderer: Arc<dyn TemplateRenderer>,
    processors: ContextProcessors,
    catalog: Arc<Catalog>,
}

impl TemplateHost {
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        processors: ContextProcessors,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            renderer,
            processors,
            catalog,
        }
    }

    pub fn processors(&self) -> &ContextProcessors {
        &self.processors
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl RenderHost for TemplateHost {
    fn render_to_string(
        &self,
        request: &RenderRequest,
        template: &str,
        context: ContextMap,
    ) -> Result<String, RenderError> {
        // Built per call; request contexts never leak between renders
        let request_context = self
            .processors
            .wrap_request_context(request, ContextMap::new());
        self.renderer
            .render_to_string(template, &context, &request_context)
    }

    fn translate(&self, request: &RenderRequest, source: &str) -> String {
        self.catalog.translate(source, &request.language)
    }
}

impl std::fmt::Debug for TemplateHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateHost")
            .field("processors", &self.processors)
            .finish()
    }
}
