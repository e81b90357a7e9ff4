//! Standard request context for templates.
//!
//! Each processor maps the request to a few template variables. Processors
//! run in order and later ones override keys set by earlier ones, so the
//! result only depends on the request and the processor list.

use std::sync::Arc;

use serde_json::{Value, json};
use tessera_sdk::request::{ContextMap, RenderRequest};

use crate::config::Config;

/// A pure function contributing variables to the request context.
pub type ContextProcessor = Arc<dyn Fn(&RenderRequest) -> ContextMap + Send + Sync>;

/// Languages written right to left.
const BIDI_LANGUAGES: &[&str] = &["ar", "fa", "he", "ur"];

/// Settings the standard processors read.
#[derive(Debug, Clone)]
pub struct ContextSettings {
    pub static_url: String,
    pub media_url: String,
    pub debug: bool,
    pub language_code: String,
    pub languages: Vec<(String, String)>,
}

impl ContextSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            static_url: config.static_url.clone(),
            media_url: config.media_url.clone(),
            debug: config.debug,
            language_code: config.language_code.clone(),
            languages: config.languages.clone(),
        }
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Ordered list of named context processors.
#[derive(Clone, Default)]
pub struct ContextProcessors {
    processors: Vec<(&'static str, ContextProcessor)>,
}

impl ContextProcessors {
    /// No processors; the request context is just the base map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard processors: request, static, csrf, media, i18n, auth,
    /// messages, debug.
    pub fn standard(settings: &ContextSettings) -> Self {
        let static_url = settings.static_url.clone();
        let media_url = settings.media_url.clone();
        let languages = settings.languages.clone();
        let default_language = settings.language_code.clone();
        let debug = settings.debug;

        Self::new()
            .push("request", |request| {
                single("request", serde_json::to_value(request).unwrap_or(Value::Null))
            })
            .push("static", move |_| single("STATIC_URL", json!(static_url)))
            .push("csrf", |request| {
                single("csrf_token", json!(request.csrf_token.as_deref().unwrap_or("")))
            })
            .push("media", move |_| single("MEDIA_URL", json!(media_url)))
            .push("i18n", move |request| i18n(request, &languages, &default_language))
            .push("auth", auth)
            .push("messages", |request| {
                single("messages", json!(request.messages))
            })
            .push("debug", move |_| single("debug", json!(debug)))
    }

    /// Append a processor. It runs after every processor added before it.
    pub fn push<F>(mut self, name: &'static str, processor: F) -> Self
    where
        F: Fn(&RenderRequest) -> ContextMap + Send + Sync + 'static,
    {
        self.processors.push((name, Arc::new(processor)));
        self
    }

    /// Processor names in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|(name, _)| *name).collect()
    }

    /// Fold every processor's variables over `base`.
    pub fn wrap_request_context(&self, request: &RenderRequest, base: ContextMap) -> ContextMap {
        self.processors
            .iter()
            .fold(base, |mut context, (_, processor)| {
                context.extend(processor(request));
                context
            })
    }
}

impl std::fmt::Debug for ContextProcessors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextProcessors")
            .field("processors", &self.names())
            .finish()
    }
}

fn single(key: &str, value: Value) -> ContextMap {
    let mut context = ContextMap::new();
    context.insert(key.to_string(), value);
    context
}

fn i18n(request: &RenderRequest, languages: &[(String, String)], default: &str) -> ContextMap {
    let code = if request.language.is_empty() {
        default
    } else {
        request.language.as_str()
    };
    let primary = code.split('-').next().unwrap_or(code);

    let mut context = ContextMap::new();
    context.insert("LANGUAGES".to_string(), json!(languages));
    context.insert("LANGUAGE_CODE".to_string(), json!(code));
    context.insert(
        "LANGUAGE_BIDI".to_string(),
        json!(BIDI_LANGUAGES.contains(&primary)),
    );
    context
}

fn auth(request: &RenderRequest) -> ContextMap {
    let mut context = ContextMap::new();
    match &request.user {
        Some(user) => {
            context.insert(
                "user".to_string(),
                json!({
                    "id": user.id,
                    "username": user.username,
                    "is_authenticated": true,
                }),
            );
            context.insert("perms".to_string(), json!(user.permissions));
        }
        None => {
            context.insert(
                "user".to_string(),
                json!({ "username": "", "is_authenticated": false }),
            );
            context.insert("perms".to_string(), json!([]));
        }
    }
    context
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tessera_sdk::request::{FlashMessage, MessageLevel, UserIdentity};
    use uuid::Uuid;

    fn settings() -> ContextSettings {
        ContextSettings {
            languages: vec![
                ("en".to_string(), "English".to_string()),
                ("he".to_string(), "Hebrew".to_string()),
            ],
            ..ContextSettings::default()
        }
    }

    #[test]
    fn standard_order() {
        let processors = ContextProcessors::standard(&settings());
        assert_eq!(
            processors.names(),
            vec!["request", "static", "csrf", "media", "i18n", "auth", "messages", "debug"]
        );
    }

    #[test]
    fn standard_context_has_every_key() {
        let processors = ContextProcessors::standard(&settings());
        let context = processors.wrap_request_context(&RenderRequest::get("/"), ContextMap::new());

        for key in [
            "request",
            "STATIC_URL",
            "csrf_token",
            "MEDIA_URL",
            "LANGUAGES",
            "LANGUAGE_CODE",
            "LANGUAGE_BIDI",
            "user",
            "perms",
            "messages",
            "debug",
        ] {
            assert!(context.contains_key(key), "missing {key}");
        }
        assert_eq!(context["STATIC_URL"], "/static/");
        assert_eq!(context["user"]["is_authenticated"], false);
    }

    #[test]
    fn wrapping_twice_is_idempotent() {
        let processors = ContextProcessors::standard(&settings());
        let request = RenderRequest::get("/").csrf_token("tok");

        let once = processors.wrap_request_context(&request, ContextMap::new());
        let twice = processors.wrap_request_context(&request, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn later_processors_override_earlier_ones() {
        let processors = ContextProcessors::new()
            .push("first", |_| single("x", json!(1)))
            .push("second", |_| single("x", json!(2)));

        let mut base = ContextMap::new();
        base.insert("x".to_string(), json!(0));
        base.insert("kept".to_string(), json!(true));

        let context = processors.wrap_request_context(&RenderRequest::default(), base);
        assert_eq!(context["x"], 2);
        assert_eq!(context["kept"], true);
    }

    #[test]
    fn auth_exposes_user_and_perms() {
        let mut user = UserIdentity::new(Uuid::nil(), "editor");
        user.permissions.push("edit content".to_string());
        let request = RenderRequest::get("/").user(user);

        let context = ContextProcessors::standard(&settings())
            .wrap_request_context(&request, ContextMap::new());
        assert_eq!(context["user"]["username"], "editor");
        assert_eq!(context["perms"], json!(["edit content"]));
    }

    #[test]
    fn bidi_follows_request_language() {
        let processors = ContextProcessors::standard(&settings());

        let hebrew = processors
            .wrap_request_context(&RenderRequest::get("/").language("he"), ContextMap::new());
        assert_eq!(hebrew["LANGUAGE_CODE"], "he");
        assert_eq!(hebrew["LANGUAGE_BIDI"], true);

        let english =
            processors.wrap_request_context(&RenderRequest::get("/"), ContextMap::new());
        assert_eq!(english["LANGUAGE_BIDI"], false);
    }

    #[test]
    fn messages_are_listed() {
        let request =
            RenderRequest::get("/").message(FlashMessage::new(MessageLevel::Success, "Saved"));
        let context = ContextProcessors::standard(&settings())
            .wrap_request_context(&request, ContextMap::new());
        assert_eq!(context["messages"][0]["level"], "success");
        assert_eq!(context["messages"][0]["message"], "Saved");
    }
}
