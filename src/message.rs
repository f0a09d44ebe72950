//! Message renderer: turns an alert batch into the text a channel sends.
//!
//! The renderer picks a state symbol, expands the title and message
//! templates, appends a deep link to the alert list and the URL of every
//! stored image. Template and image failures never stop it. Template errors
//! are handed back to the caller for logging.

use serde::Deserialize;

use crate::alert::{AlertBatch, AlertStatus};
use crate::error::TemplateError;
use crate::images::{ImageStore, with_stored_images};
use crate::template::{DEFAULT_TITLE_TEMPLATE, TemplateData, TemplateExpander, TemplateRenderer};

/// Path of the alert list, appended to the external URL.
pub const ALERT_LIST_PATH: &str = "/alerting/list";

/// Check mark button.
pub const RESOLVED_SYMBOL: &str = "\u{2705}";
/// Warning sign.
pub const FIRING_SYMBOL: &str = "\u{26A0}\u{FE0F}";
/// Question mark.
pub const NO_DATA_SYMBOL: &str = "\u{2753}\u{FE0F}";

/// Aggregate state of a batch, as far as symbol selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Firing,
    Resolved,
    NoData,
}

/// Mapping from batch state to the glyph prefixed to the message.
///
/// Without a `no_data` symbol the mapping is two-state and no-data alerts
/// are reported as firing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateSymbols {
    #[serde(default = "default_firing")]
    pub firing: String,
    #[serde(default = "default_resolved")]
    pub resolved: String,
    #[serde(default)]
    pub no_data: Option<String>,
}

fn default_firing() -> String {
    FIRING_SYMBOL.to_string()
}

fn default_resolved() -> String {
    RESOLVED_SYMBOL.to_string()
}

impl StateSymbols {
    /// Firing and resolved only.
    pub fn two_state() -> Self {
        Self {
            firing: default_firing(),
            resolved: default_resolved(),
            no_data: None,
        }
    }

    /// Firing, resolved, and a distinct symbol for no-data batches.
    pub fn three_state() -> Self {
        Self {
            no_data: Some(NO_DATA_SYMBOL.to_string()),
            ..Self::two_state()
        }
    }

    /// Classify `batch` according to this mapping.
    ///
    /// A batch is in the no-data state when the mapping has a no-data symbol
    /// and every firing alert in it is a no-data alert.
    pub fn state_of(&self, batch: &AlertBatch) -> BatchState {
        match batch.status() {
            AlertStatus::Resolved => BatchState::Resolved,
            AlertStatus::Firing if self.no_data.is_some() && batch.firing().all(|a| a.is_no_data()) => {
                BatchState::NoData
            }
            AlertStatus::Firing => BatchState::Firing,
        }
    }

    pub fn symbol_for(&self, batch: &AlertBatch) -> &str {
        match self.state_of(batch) {
            BatchState::Resolved => &self.resolved,
            BatchState::NoData => self.no_data.as_deref().unwrap_or(&self.firing),
            BatchState::Firing => &self.firing,
        }
    }
}

impl Default for StateSymbols {
    fn default() -> Self {
        Self::two_state()
    }
}

/// Message produced for one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
    pub state_symbol: String,
}

impl RenderedMessage {
    /// Final markdown text: symbol and title on the first line, then the body.
    pub fn text(&self) -> String {
        let mut text = String::new();
        if !self.state_symbol.is_empty() {
            text.push_str(&self.state_symbol);
            text.push(' ');
        }
        text.push_str(&self.title);
        text.push_str("\n\n");
        text.push_str(&self.body);
        text
    }
}

/// Result of rendering: the message, plus the first template error if any.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub message: RenderedMessage,
    pub template_error: Option<TemplateError>,
}

/// Collaborators and notifier settings used to render messages.
pub struct RenderContext<'a> {
    pub templates: &'a dyn TemplateRenderer,
    pub images: &'a dyn ImageStore,
    pub symbols: &'a StateSymbols,
    /// Receiver name exposed to templates.
    pub receiver: &'a str,
}

/// Join the external URL and the alert list path.
pub fn alert_list_url(external_url: &str) -> String {
    format!("{}{}", external_url.trim_end_matches('/'), ALERT_LIST_PATH)
}

/// Render `batch` with `message_template` (a template name or inline
/// template).
pub async fn render_message(
    ctx: &RenderContext<'_>,
    batch: &AlertBatch,
    message_template: &str,
) -> Rendered {
    let data = TemplateData::new(ctx.receiver, batch, ctx.templates.external_url());

    let (title, content, template_error) = {
        let mut expander = TemplateExpander::new(ctx.templates, &data);
        let title = expander.expand(DEFAULT_TITLE_TEMPLATE);
        let content = expander.expand(message_template);
        (title, content, expander.into_error())
    };

    let mut body = format!(
        "*Message:*\n{}\n*URL:* {}\n",
        content.trim_end(),
        alert_list_url(ctx.templates.external_url())
    );

    with_stored_images(ctx.images, batch, |_, image| {
        if !image.url.is_empty() {
            body.push_str(&format!("*Image:* {}\n", image.url));
        }
    })
    .await;

    Rendered {
        message: RenderedMessage {
            title,
            body,
            state_symbol: ctx.symbols.symbol_for(batch).to_string(),
        },
        template_error,
    }
}
