//! HTML helpers for plugin output.

use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\n{2,}").expect("paragraph break pattern is valid")
});

/// Escape HTML special characters.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Convert plain text line breaks into HTML.
///
/// Two or more newlines start a new `<p>`, a single newline becomes `<br>`.
/// The input is not escaped here; callers escape untrusted text first.
pub fn linebreaks(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_BREAK
        .split(&normalized)
        .map(|para| format!("<p>{}</p>", para.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the inline block shown in place of an item that failed to render.
///
/// Both the label and the message are escaped, so error text echoing
/// untrusted input cannot inject markup.
pub fn error_block(label: &str, message: &str) -> String {
    format!(
        "<div class=\"tessera-error\" style=\"color: red; border: 1px solid red; padding: 5px;\">\
         <p><strong>{}</strong></p>{}</div>",
        escape(label),
        linebreaks(&escape(message))
    )
}
