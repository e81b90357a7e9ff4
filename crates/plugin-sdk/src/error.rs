//! Errors raised by plugin code and the collaborators it reads from.

use thiserror::Error;
use uuid::Uuid;

/// A failure while producing the output of one content item.
///
/// The kernel never lets these escape a page render: each one is turned
/// into an inline error block by [`ContentPlugin::render_error`].
///
/// [`ContentPlugin::render_error`]: crate::plugin::ContentPlugin::render_error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The template engine rejected or failed the template.
    #[error("template '{template}' failed to render: {details}")]
    Template { template: String, details: String },

    /// The plugin could not build its template context.
    #[error("failed to build template context: {0}")]
    Context(String),

    /// Plugin code panicked while rendering.
    #[error("plugin '{plugin}' panicked: {message}")]
    Panicked { plugin: String, message: String },

    /// Any other plugin-reported failure.
    #[error("{0}")]
    Other(String),
}

impl RenderError {
    /// Create a template error.
    pub fn template(template: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            details: details.into(),
        }
    }

    /// Create an error from any message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Context(e.to_string())
    }
}

/// Errors from an [`ItemSource`](crate::plugin::ItemSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store could not be queried.
    #[error("item source unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned into a content item.
    #[error("content item {id}: {details}")]
    Decode { id: Uuid, details: String },
}
