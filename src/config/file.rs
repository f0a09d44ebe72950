//! YAML configuration file holding notifiers and shared templates.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::channel::NotifierConfig;
use crate::error::ConfigError;
use crate::template::JinjaTemplates;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/alert-dispatch/config.yaml";

/// Top-level configuration document.
///
/// ```yaml
/// external_url: https://grafana.example.com
/// templates:
///   ops.message: "{{ firing }} firing, {{ resolved }} resolved"
/// notifiers:
///   - name: webex-ops
///     type: webex
///     settings:
///       webhook_url: https://webexapis.com/v1/webhooks/incoming/abc
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsFile {
    /// Base URL of the alerting UI, used for deep links in messages.
    #[serde(default)]
    pub external_url: String,
    /// Named templates available to every notifier, in addition to the
    /// built-in `default.title` and `default.message`.
    #[serde(default)]
    pub templates: HashMap<String, String>,
    /// Notifier definitions.
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

impl ChannelsFile {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse the configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Template engine holding the built-in templates plus the named
    /// templates of this file.
    pub fn template_renderer(&self) -> Result<JinjaTemplates, ConfigError> {
        let mut names: Vec<_> = self.templates.keys().collect();
        names.sort();

        let mut templates = JinjaTemplates::new(self.external_url.clone());
        for name in names {
            templates = templates
                .with_template(name.clone(), self.templates[name].clone())
                .map_err(|e| ConfigError::InvalidTemplate {
                    key: format!("templates.{}", name),
                    message: e.to_string(),
                })?;
        }
        Ok(templates)
    }
}
