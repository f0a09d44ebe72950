//! Templating capability consumed by the message renderer.
//!
//! Notifiers never talk to a template engine directly. They go through the
//! [`TemplateRenderer`] trait, which renders either a registered template
//! (by name) or an inline template string against a [`TemplateData`]
//! context built from the alert batch.
//!
//! # Example
//!
//! ```
//! use alert_dispatch::alert::{Alert, AlertBatch};
//! use alert_dispatch::template::{JinjaTemplates, TemplateData, TemplateRenderer};
//!
//! let templates = JinjaTemplates::new("https://grafana.example.com");
//! let batch = AlertBatch::new(vec![Alert::firing().with_label("alertname", "HighCPU")]);
//! let data = TemplateData::new("ops", &batch, templates.external_url());
//!
//! let title = templates.render("default.title", &data).unwrap();
//! assert_eq!(title, "[FIRING:1] HighCPU");
//! ```

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::alert::{Alert, AlertBatch, AlertStatus};
use crate::error::TemplateError;

/// Name of the built-in title template.
pub const DEFAULT_TITLE_TEMPLATE: &str = "default.title";

/// Name of the built-in message template.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "default.message";

const DEFAULT_TITLE: &str = r#"[{{ status | upper }}{% if status == "firing" %}:{{ firing }}{% endif %}] {{ common_labels.alertname }}"#;

const DEFAULT_MESSAGE: &str = r#"{% macro details(alert) %}
Labels:
{% for name, value in alert.labels | items %}
 - {{ name }} = {{ value }}
{% endfor %}
{% if alert.annotations %}
Annotations:
{% for name, value in alert.annotations | items %}
 - {{ name }} = {{ value }}
{% endfor %}
{% endif %}
{% if alert.generator_url %}
Source: {{ alert.generator_url }}
{% endif %}
{% endmacro %}
{% if firing > 0 %}
**Firing**
{% for alert in alerts %}
{% if alert.status == "firing" %}
{{ details(alert) }}
{% endif %}
{% endfor %}
{% endif %}
{% if resolved > 0 %}
**Resolved**
{% for alert in alerts %}
{% if alert.status == "resolved" %}
{{ details(alert) }}
{% endif %}
{% endfor %}
{% endif %}
"#;

/// One alert as exposed to templates.
///
/// Internal annotations (prefixed with `__`) are not exposed.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateAlert {
    pub status: AlertStatus,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    pub generator_url: Option<String>,
}

impl From<&Alert> for TemplateAlert {
    fn from(alert: &Alert) -> Self {
        Self {
            status: alert.status,
            labels: alert.labels.clone(),
            annotations: alert
                .annotations
                .iter()
                .filter(|(name, _)| !name.starts_with("__"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            starts_at: alert.starts_at.to_rfc3339(),
            ends_at: alert.ends_at.map(|t| t.to_rfc3339()),
            generator_url: alert.generator_url.clone(),
        }
    }
}

/// Context handed to templates.
///
/// Built only from the alert batch and public notifier metadata. Secrets
/// are never part of it.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub receiver: String,
    pub status: AlertStatus,
    pub alerts: Vec<TemplateAlert>,
    pub firing: usize,
    pub resolved: usize,
    pub common_labels: BTreeMap<String, String>,
    pub common_annotations: BTreeMap<String, String>,
    pub external_url: String,
}

impl TemplateData {
    pub fn new(receiver: &str, batch: &AlertBatch, external_url: &str) -> Self {
        let common_annotations = batch
            .common_annotations()
            .into_iter()
            .filter(|(name, _)| !name.starts_with("__"))
            .collect();
        Self {
            receiver: receiver.to_string(),
            status: batch.status(),
            alerts: batch.iter().map(TemplateAlert::from).collect(),
            firing: batch.firing().count(),
            resolved: batch.resolved().count(),
            common_labels: batch.common_labels(),
            common_annotations,
            external_url: external_url.to_string(),
        }
    }
}

/// Renders templates for notifiers.
pub trait TemplateRenderer: Send + Sync {
    /// Render `source`, which is either the name of a registered template or
    /// an inline template string.
    fn render(&self, source: &str, data: &TemplateData) -> Result<String, TemplateError>;

    /// Base URL of the alerting UI, used to build deep links.
    fn external_url(&self) -> &str;
}

/// [`TemplateRenderer`] backed by minijinja.
///
/// Undefined variables render as empty strings. Block tags swallow their
/// trailing newline so templates can be written one tag per line.
pub struct JinjaTemplates {
    env: Environment<'static>,
    external_url: String,
}

impl JinjaTemplates {
    /// Create an engine with the built-in `default.title` and
    /// `default.message` templates.
    pub fn new(external_url: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(DEFAULT_TITLE_TEMPLATE, DEFAULT_TITLE)
            .expect("built-in title template is valid");
        env.add_template(DEFAULT_MESSAGE_TEMPLATE, DEFAULT_MESSAGE)
            .expect("built-in message template is valid");

        Self {
            env,
            external_url: external_url.into(),
        }
    }

    /// Register a named template, replacing any template with the same name.
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        self.env
            .add_template_owned(name.into(), source.into())
            .map_err(|e| TemplateError::RenderFailed {
                message: e.to_string(),
            })?;
        Ok(self)
    }
}

impl TemplateRenderer for JinjaTemplates {
    fn render(&self, source: &str, data: &TemplateData) -> Result<String, TemplateError> {
        tracing::trace!(source_len = source.len(), "Starting template render");

        let result = match self.env.get_template(source) {
            Ok(template) => template.render(data),
            Err(_) => self.env.render_str(source, data),
        };
        result.map_err(|e| TemplateError::RenderFailed {
            message: e.to_string(),
        })
    }

    fn external_url(&self) -> &str {
        &self.external_url
    }
}

impl std::fmt::Debug for JinjaTemplates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplates")
            .field(
                "templates",
                &self.env.templates().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("external_url", &self.external_url)
            .finish()
    }
}

/// Expands several templates against one context, keeping the first error.
///
/// A failed expansion yields an empty string so that callers can keep
/// building a best-effort message.
pub struct TemplateExpander<'a> {
    renderer: &'a dyn TemplateRenderer,
    data: &'a TemplateData,
    error: Option<TemplateError>,
}

impl<'a> TemplateExpander<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer, data: &'a TemplateData) -> Self {
        Self {
            renderer,
            data,
            error: None,
        }
    }

    pub fn expand(&mut self, source: &str) -> String {
        match self.renderer.render(source, self.data) {
            Ok(text) => text,
            Err(e) => {
                self.error.get_or_insert(e);
                String::new()
            }
        }
    }

    /// First error encountered, if any.
    pub fn into_error(self) -> Option<TemplateError> {
        self.error
    }
}
