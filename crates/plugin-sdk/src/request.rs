//! Per-request state handed to plugins during rendering.
//!
//! A `RenderRequest` is created by the host for each incoming request and
//! only read by plugins. Nothing here outlives the request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DEFAULT_LANGUAGE, SiteId};

/// Variable bag passed to templates.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Cached permissions for the user.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserIdentity {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            permissions: Vec::new(),
        }
    }

    /// Check if user has a specific permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// A one-shot message queued for display on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: MessageLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: MessageLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Request information available to plugins and templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Host header, if known.
    #[serde(default)]
    pub host: Option<String>,
    /// Site serving this request. `None` means the configured default site.
    #[serde(default)]
    pub site_id: Option<SiteId>,
    /// Active language code.
    pub language: String,
    /// Authenticated user (None for anonymous).
    #[serde(default)]
    pub user: Option<UserIdentity>,
    /// CSRF token for forms rendered inside plugin output.
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Pending flash messages.
    #[serde(default)]
    pub messages: Vec<FlashMessage>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            host: None,
            site_id: None,
            language: DEFAULT_LANGUAGE.to_string(),
            user: None,
            csrf_token: None,
            messages: Vec::new(),
        }
    }
}

impl RenderRequest {
    /// Create a GET request for the given path.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn message(mut self, message: FlashMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Whether the request carries an authenticated user.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
