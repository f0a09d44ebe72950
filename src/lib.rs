// src/lib.rs
//! alert-dispatch - Alert notification dispatch to Webex and generic webhooks.

pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod message;
pub mod metrics;
pub mod notify;
pub mod template;

// Re-export commonly used types
pub use alert::{Alert, AlertBatch, AlertStatus};
pub use cli::LogFormat;
pub use config::{ChannelsFile, NotifierConfig, SecretResolver, SecretString};
pub use message::{RenderedMessage, StateSymbols};
pub use metrics::register_metric_descriptions;
pub use notify::{
    ChannelRegistry, Collaborators, DeliveryContext, HttpTransport, Notifier, NotifierRegistry,
    WebhookTransport,
};
pub use template::{JinjaTemplates, TemplateRenderer};
