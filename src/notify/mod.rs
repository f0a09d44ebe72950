//! Notification dispatch: the `Notifier` abstraction and the pipeline every
//! channel is built from.
//!
//! # Architecture
//!
//! Each notification attempt runs through the same stages:
//! ```text
//! config validation -> message rendering -> payload building -> delivery
//! ```
//!
//! - **Validation** happens once, when a channel factory builds the notifier
//!   from its [`crate::config::NotifierConfig`].
//! - **Rendering** uses the injected [`crate::template::TemplateRenderer`] and
//!   [`crate::images::ImageStore`]. Failures there are logged, never fatal.
//! - **Payload building** is channel specific (see [`webex`], [`webhook`]).
//! - **Delivery** goes through [`executor::deliver`], which calls the injected
//!   [`WebhookTransport`] exactly once and honours the [`DeliveryContext`].
//!
//! Channels are looked up by type in a [`ChannelRegistry`]. Built notifiers
//! are kept by name in a [`NotifierRegistry`].

pub mod context;
pub mod executor;
pub mod payload;
pub mod registry;
mod traits;
pub mod transport;
pub mod webex;
pub mod webhook;

use crate::config::NotifierConfig;
use crate::error::{NotifyError, TemplateError};

pub use context::DeliveryContext;
pub use executor::{NotifierInfo, deliver};
pub use registry::{
    BUILTIN_CHANNELS, ChannelDescriptor, ChannelFactory, ChannelOption, ChannelRegistry,
    Collaborators, FactoryConfig, NotifierRegistry,
};
pub use traits::Notifier;
pub use transport::{HttpTransport, WebhookMessage, WebhookTransport};
pub use webex::{WebexConfig, WebexNotifier, WebexSchema, WebexTarget};
pub use webhook::{WebhookConfig, WebhookNotifier};

/// Outcome of one notification attempt.
pub type DeliveryOutcome = Result<bool, NotifyError>;

/// Identity and resolve policy shared by every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierMeta {
    pub uid: String,
    pub name: String,
    pub channel_type: String,
    pub disable_resolve_message: bool,
}

impl NotifierMeta {
    /// Identity of `config`. A missing uid falls back to the name.
    pub fn from_config(config: &NotifierConfig) -> Self {
        let uid = if config.uid.is_empty() {
            config.name.clone()
        } else {
            config.uid.clone()
        };
        Self {
            uid,
            name: config.name.clone(),
            channel_type: config.channel_type.clone(),
            disable_resolve_message: config.disable_resolve_message,
        }
    }

    pub fn send_resolved(&self) -> bool {
        !self.disable_resolve_message
    }

    pub fn info(&self) -> NotifierInfo<'_> {
        NotifierInfo {
            name: &self.name,
            notifier_type: &self.channel_type,
        }
    }
}

/// Log and count a template error. Delivery goes on with the partial
/// message.
pub(crate) fn report_template_error(notifier: NotifierInfo<'_>, err: &TemplateError) {
    tracing::warn!(
        notifier_name = %notifier.name,
        notifier_type = %notifier.notifier_type,
        error = %err,
        "Failed to template notification message"
    );
    metrics::counter!(
        "alert_dispatch_template_errors_total",
        "notifier_name" => notifier.name.to_string(),
        "notifier_type" => notifier.notifier_type.to_string()
    )
    .increment(1);
}

/// Log a payload that could not be built. The attempt fails.
pub(crate) fn report_payload_error(notifier: NotifierInfo<'_>, err: &NotifyError) {
    tracing::error!(
        notifier_name = %notifier.name,
        notifier_type = %notifier.notifier_type,
        error = %err,
        "Failed to build notification payload"
    );
}
