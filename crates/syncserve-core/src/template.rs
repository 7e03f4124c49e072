//! Webhook payload templates
//!
//! Templates use handlebars syntax and see four fields:
//!
//! | Field        | Value                                   |
//! |--------------|-----------------------------------------|
//! | `Repository` | repository URL                          |
//! | `Branch`     | synced branch                           |
//! | `Action`     | `Cloned` or `Updated`                   |
//! | `String`     | `"<Action> <Repository>"`               |
//!
//! Rendering is strict: referencing any other field is an error rather than
//! an empty string. Output is not HTML-escaped.

use handlebars::Handlebars;
use serde::Serialize;

use crate::{Error, Event, Result, SyncAction};

/// Template used when none is configured.
pub const DEFAULT_PAYLOAD_TEMPLATE: &str = "{{String}}";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateContext<'a> {
    repository: &'a str,
    branch: &'a str,
    action: SyncAction,
    string: String,
}

impl<'a> From<&'a Event> for TemplateContext<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            repository: event.repository(),
            branch: event.branch(),
            action: event.action(),
            string: event.to_string(),
        }
    }
}

/// A payload template and the renderer configured for it.
#[derive(Debug, Clone)]
pub struct PayloadTemplate {
    source: String,
    registry: Handlebars<'static>,
}

impl PayloadTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        Self {
            source: source.into(),
            registry,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check that the template parses.
    ///
    /// Unknown fields are only detected at render time.
    pub fn check(&self) -> Result<()> {
        handlebars::Template::compile(&self.source)
            .map(|_| ())
            .map_err(|e| Error::Template(e.to_string()))
    }

    /// Render the payload body for `event`.
    pub fn render(&self, event: &Event) -> Result<Vec<u8>> {
        self.registry
            .render_template(&self.source, &TemplateContext::from(event))
            .map(String::into_bytes)
            .map_err(|e| Error::Template(e.to_string()))
    }
}

impl Default for PayloadTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_TEMPLATE)
    }
}
