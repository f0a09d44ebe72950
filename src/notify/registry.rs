//! Channel and notifier registries.
//!
//! [`ChannelRegistry`] maps a channel type (`"webex"`, `"webhook"`) to the
//! factory that validates a [`NotifierConfig`] and builds the notifier.
//! [`NotifierRegistry`] keeps the built notifiers by name.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;

use super::{DeliveryContext, DeliveryOutcome, HttpTransport, Notifier, WebhookTransport};
use super::{webex::WEBEX_CHANNEL, webhook::WEBHOOK_CHANNEL};
use crate::alert::{AlertBatch, AlertStatus};
use crate::config::{EnvSecretResolver, NotifierConfig, SecretResolver};
use crate::error::ConfigError;
use crate::images::{ImageStore, NoImageStore};
use crate::template::TemplateRenderer;

/// Builds a notifier from its configuration.
pub type ChannelFactory = fn(FactoryConfig<'_>) -> Result<Arc<dyn Notifier>, ConfigError>;

/// One setting a channel understands, for UI and validation tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOption {
    pub property_name: &'static str,
    pub label: &'static str,
    pub required: bool,
    /// Stored in `secure_settings` rather than `settings`.
    pub secure: bool,
    /// Settings schema versions this option belongs to. Empty means every
    /// version; `required` only applies within these.
    pub schema_versions: &'static [u32],
}

/// Static description of a channel type.
#[derive(Clone, Copy)]
pub struct ChannelDescriptor {
    pub channel_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub factory: ChannelFactory,
    pub options: &'static [ChannelOption],
}

impl std::fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("channel_type", &self.channel_type)
            .field("name", &self.name)
            .field("options", &self.options.len())
            .finish()
    }
}

/// Channels shipped with the crate.
pub const BUILTIN_CHANNELS: &[ChannelDescriptor] = &[WEBEX_CHANNEL, WEBHOOK_CHANNEL];

/// Services a notifier depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub secrets: Arc<dyn SecretResolver>,
    pub images: Arc<dyn ImageStore>,
    pub transport: Arc<dyn WebhookTransport>,
    pub templates: Arc<dyn TemplateRenderer>,
}

impl Collaborators {
    /// Environment-backed secrets, no image store and an HTTP transport.
    pub fn new(templates: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            secrets: Arc::new(EnvSecretResolver),
            images: Arc::new(NoImageStore),
            transport: Arc::new(HttpTransport::default()),
            templates,
        }
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretResolver>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = images;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn WebhookTransport>) -> Self {
        self.transport = transport;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Input of a [`ChannelFactory`].
#[derive(Debug, Clone, Copy)]
pub struct FactoryConfig<'a> {
    pub config: &'a NotifierConfig,
    pub collaborators: &'a Collaborators,
}

/// Channel types known to the process.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<&'static str, ChannelDescriptor>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every entry of [`BUILTIN_CHANNELS`].
    pub fn with_builtin_channels() -> Self {
        let channels = BUILTIN_CHANNELS
            .iter()
            .map(|descriptor| (descriptor.channel_type, *descriptor))
            .collect();
        Self { channels }
    }

    /// Add a channel type. Fails if the type is already registered.
    pub fn register(&mut self, descriptor: ChannelDescriptor) -> Result<(), ConfigError> {
        if self.channels.contains_key(descriptor.channel_type) {
            return Err(ConfigError::DuplicateChannel(
                descriptor.channel_type.to_string(),
            ));
        }
        self.channels.insert(descriptor.channel_type, descriptor);
        Ok(())
    }

    pub fn get(&self, channel_type: &str) -> Option<&ChannelDescriptor> {
        self.channels.get(channel_type)
    }

    /// Registered channel types, sorted.
    pub fn channel_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.channels.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Validate `fc.config` and build its notifier.
    ///
    /// Factory errors are wrapped in [`ConfigError::InvalidNotifier`] naming
    /// the notifier.
    pub fn build(&self, fc: FactoryConfig<'_>) -> Result<Arc<dyn Notifier>, ConfigError> {
        let config = fc.config;
        let result = match self.get(&config.channel_type) {
            Some(descriptor) => {
                (descriptor.factory)(fc).map_err(|e| ConfigError::InvalidNotifier {
                    name: config.name.clone(),
                    message: e.to_string(),
                })
            }
            None => Err(ConfigError::UnknownChannel(config.channel_type.clone())),
        };

        match &result {
            Ok(_) => tracing::info!(
                notifier_name = %config.name,
                notifier_type = %config.channel_type,
                send_resolved = !config.disable_resolve_message,
                "Registered notifier from config"
            ),
            Err(e) => {
                tracing::error!(
                    notifier_name = %config.name,
                    notifier_type = %config.channel_type,
                    error = %e,
                    "Invalid notifier configuration"
                );
                metrics::counter!(
                    "alert_dispatch_notifier_config_errors_total",
                    "notifier_name" => config.name.clone(),
                    "notifier_type" => config.channel_type.clone()
                )
                .increment(1);
            }
        }
        result
    }
}

/// Registry for managing named notifiers.
#[derive(Debug, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<String, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notifier by name.
    ///
    /// # Returns
    ///
    /// Error if a notifier with the same name already exists.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) -> Result<(), ConfigError> {
        let name = notifier.name().to_string();
        if self.notifiers.contains_key(&name) {
            return Err(ConfigError::DuplicateNotifier(name));
        }
        self.notifiers.insert(name, notifier);
        Ok(())
    }

    /// Get a notifier by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Notifier>> {
        self.notifiers.get(name).cloned()
    }

    /// Registered notifier names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.notifiers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Build every configured notifier.
    ///
    /// # Returns
    ///
    /// * `Ok(NotifierRegistry)` - Registry with all configured notifiers
    /// * `Err(Vec<ConfigError>)` - All errors encountered during instantiation
    pub fn from_config(
        configs: &[NotifierConfig],
        channels: &ChannelRegistry,
        collaborators: Collaborators,
    ) -> Result<Self, Vec<ConfigError>> {
        let mut registry = NotifierRegistry::new();
        let mut errors = Vec::new();

        for config in configs {
            let fc = FactoryConfig {
                config,
                collaborators: &collaborators,
            };
            match channels.build(fc) {
                Ok(notifier) => {
                    if let Err(e) = registry.register(notifier) {
                        errors.push(e);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(errors)
        }
    }

    /// Send `batch` to every notifier concurrently.
    ///
    /// Notifiers that do not send resolved messages are skipped when the
    /// batch is resolved. Returns one outcome per notifier that was called,
    /// sorted by name.
    pub async fn notify_all(
        &self,
        ctx: &DeliveryContext,
        batch: &AlertBatch,
    ) -> Vec<(String, DeliveryOutcome)> {
        let resolved = batch.status() == AlertStatus::Resolved;

        let sends = self
            .notifiers
            .values()
            .filter(|notifier| {
                let suppressed = resolved && !notifier.send_resolved();
                if suppressed {
                    tracing::debug!(
                        notifier_name = %notifier.name(),
                        "Skipping resolved notification"
                    );
                }
                !suppressed
            })
            .map(|notifier| async move {
                let outcome = notifier.notify(ctx, batch).await;
                (notifier.name().to_string(), outcome)
            });

        let mut outcomes = join_all(sends).await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        outcomes
    }
}
