//! Persisted notifier configuration, as handed to channel factories.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::secret::SecureSettings;
use super::settings::Settings;

/// Configuration of one notifier, tagged with its channel type.
///
/// This is the raw record loaded from storage. Channel validators turn it
/// into a typed configuration once, when the notifier is built. Nothing
/// downstream reads `settings` again.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Unique identifier of the notifier.
    #[serde(default)]
    pub uid: String,
    /// Human-readable name, used in logs and metrics.
    pub name: String,
    /// Channel type (e.g., "webex", "webhook").
    #[serde(rename = "type")]
    pub channel_type: String,
    /// When set, resolved notifications are never sent to this notifier.
    #[serde(default)]
    pub disable_resolve_message: bool,
    /// Version of the channel's settings schema. Inferred from the settings
    /// when absent.
    #[serde(default)]
    pub schema_version: Option<u32>,
    /// Raw channel settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Encrypted-at-rest settings (tokens, passwords).
    #[serde(default)]
    pub secure_settings: SecureSettings,
}

impl NotifierConfig {
    /// Create a configuration with empty settings.
    pub fn new(name: impl Into<String>, channel_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uid: name.clone(),
            name,
            channel_type: channel_type.into(),
            disable_resolve_message: false,
            schema_version: None,
            settings: Map::new(),
            secure_settings: SecureSettings::new(),
        }
    }

    /// Replace the raw settings. Non-object values leave the settings empty.
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = match settings {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn with_secure_settings(mut self, secure_settings: SecureSettings) -> Self {
        self.secure_settings = secure_settings;
        self
    }

    pub fn with_disable_resolve_message(mut self, disable: bool) -> Self {
        self.disable_resolve_message = disable;
        self
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = Some(version);
        self
    }

    /// Typed accessor over the raw settings.
    pub fn settings(&self) -> Settings<'_> {
        Settings::new(&self.settings)
    }
}
