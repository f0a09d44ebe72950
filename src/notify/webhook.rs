//! Generic webhook notifier.
//!
//! Sends a JSON document describing the whole alert batch to an arbitrary
//! HTTP endpoint, with an optional `Authorization` header.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::Instrument;

use super::payload::{authorization_headers, json_request};
use super::registry::{ChannelDescriptor, ChannelOption, FactoryConfig};
use super::{
    DeliveryContext, Notifier, NotifierMeta, WebhookMessage, WebhookTransport, deliver,
    report_payload_error, report_template_error,
};
use crate::alert::{AlertBatch, AlertStatus};
use crate::config::validation::{validate_http_url, validate_template};
use crate::config::{NotifierConfig, SecretResolver, SecretString};
use crate::error::{ConfigError, NotifyError};
use crate::template::{
    DEFAULT_MESSAGE_TEMPLATE, DEFAULT_TITLE_TEMPLATE, TemplateAlert, TemplateData,
    TemplateExpander, TemplateRenderer,
};

/// Channel type name.
pub const WEBHOOK_TYPE: &str = "webhook";

/// Version of the payload document.
pub const WEBHOOK_PAYLOAD_VERSION: &str = "1";

const DEFAULT_AUTHORIZATION_SCHEME: &str = "Bearer";

const WEBHOOK_OPTIONS: &[ChannelOption] = &[
    ChannelOption {
        property_name: "url",
        label: "URL",
        required: true,
        secure: false,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "http_method",
        label: "HTTP Method",
        required: false,
        secure: false,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "max_alerts",
        label: "Max Alerts",
        required: false,
        secure: false,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "authorization_scheme",
        label: "Authorization Header - Scheme",
        required: false,
        secure: false,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "authorization_credentials",
        label: "Authorization Header - Credentials",
        required: false,
        secure: true,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "title",
        label: "Title",
        required: false,
        secure: false,
        schema_versions: &[],
    },
    ChannelOption {
        property_name: "message",
        label: "Message",
        required: false,
        secure: false,
        schema_versions: &[],
    },
];

/// Descriptor registering the webhook channel.
pub const WEBHOOK_CHANNEL: ChannelDescriptor = ChannelDescriptor {
    channel_type: WEBHOOK_TYPE,
    name: "Webhook",
    description: "Sends HTTP POST or PUT request to a URL",
    factory: webhook_factory,
    options: WEBHOOK_OPTIONS,
};

/// Validated webhook configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: SecretString,
    pub method: Method,
    /// Maximum number of alerts in the payload. `None` sends every alert.
    pub max_alerts: Option<usize>,
    /// `(scheme, credentials)` for the `Authorization` header.
    pub authorization: Option<(String, SecretString)>,
    pub title_template: String,
    pub message_template: String,
}

impl WebhookConfig {
    pub fn from_settings(
        config: &NotifierConfig,
        secrets: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let settings = config.settings();

        let url = settings.required("url")?;
        validate_http_url("url", &url)?;

        let method = match settings.string_or("http_method", "POST").to_uppercase().as_str() {
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            other => {
                return Err(ConfigError::InvalidSetting {
                    key: "http_method".to_string(),
                    message: format!(
                        "unsupported method '{}': only POST and PUT are supported",
                        other
                    ),
                });
            }
        };

        let max_alerts = settings.positive_integer("max_alerts")?;

        let credentials = secrets.decrypt(
            &config.secure_settings,
            "authorization_credentials",
            &settings.string("authorization_credentials"),
        )?;
        let authorization = if credentials.expose().trim().is_empty() {
            None
        } else {
            let scheme = settings.string_or("authorization_scheme", DEFAULT_AUTHORIZATION_SCHEME);
            authorization_headers(&scheme, &credentials).map_err(|_| {
                ConfigError::InvalidSetting {
                    key: "authorization_credentials".to_string(),
                    message: "credentials contain characters not allowed in an HTTP header"
                        .to_string(),
                }
            })?;
            Some((scheme, credentials))
        };

        let title_template = settings.string_or("title", DEFAULT_TITLE_TEMPLATE);
        validate_template("title", &title_template)?;
        let message_template = settings.string_or("message", DEFAULT_MESSAGE_TEMPLATE);
        validate_template("message", &message_template)?;

        Ok(Self {
            url: SecretString::new(url),
            method,
            max_alerts,
            authorization,
            title_template,
            message_template,
        })
    }
}

/// JSON document sent to the endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload<'a> {
    pub receiver: &'a str,
    pub status: AlertStatus,
    /// `alerting` while any alert fires, `ok` once all are resolved.
    pub state: &'static str,
    pub title: String,
    pub message: String,
    pub alerts: Vec<TemplateAlert>,
    pub truncated_alerts: usize,
    pub common_labels: BTreeMap<String, String>,
    pub common_annotations: BTreeMap<String, String>,
    #[serde(rename = "externalURL")]
    pub external_url: &'a str,
    pub version: &'static str,
}

impl<'a> WebhookPayload<'a> {
    /// Build the document from template data, keeping at most `max_alerts`
    /// alerts.
    pub fn new(
        data: &'a TemplateData,
        title: String,
        message: String,
        max_alerts: Option<usize>,
    ) -> Self {
        let limit = max_alerts.unwrap_or(data.alerts.len()).min(data.alerts.len());
        Self {
            receiver: &data.receiver,
            status: data.status,
            state: match data.status {
                AlertStatus::Firing => "alerting",
                AlertStatus::Resolved => "ok",
            },
            title,
            message,
            alerts: data.alerts[..limit].to_vec(),
            truncated_alerts: data.alerts.len() - limit,
            common_labels: data.common_labels.clone(),
            common_annotations: data.common_annotations.clone(),
            external_url: &data.external_url,
            version: WEBHOOK_PAYLOAD_VERSION,
        }
    }
}

/// Build the webhook request carrying `payload`.
pub fn build_webhook_request(
    payload: &WebhookPayload<'_>,
    config: &WebhookConfig,
) -> Result<WebhookMessage, NotifyError> {
    let headers = match &config.authorization {
        Some((scheme, credentials)) => authorization_headers(scheme, credentials)?,
        None => HeaderMap::new(),
    };
    json_request(&config.url, config.method.clone(), payload, headers)
}

/// Generic webhook notifier.
pub struct WebhookNotifier {
    meta: NotifierMeta,
    config: WebhookConfig,
    transport: Arc<dyn WebhookTransport>,
    templates: Arc<dyn TemplateRenderer>,
}

impl WebhookNotifier {
    pub fn new(
        meta: NotifierMeta,
        config: WebhookConfig,
        transport: Arc<dyn WebhookTransport>,
        templates: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            meta,
            config,
            transport,
            templates,
        }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

/// Factory registered for the `webhook` channel type.
pub fn webhook_factory(fc: FactoryConfig<'_>) -> Result<Arc<dyn Notifier>, ConfigError> {
    let config = WebhookConfig::from_settings(fc.config, fc.collaborators.secrets.as_ref())?;
    Ok(Arc::new(WebhookNotifier::new(
        NotifierMeta::from_config(fc.config),
        config,
        fc.collaborators.transport.clone(),
        fc.collaborators.templates.clone(),
    )))
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.meta.name
    }

    fn uid(&self) -> &str {
        &self.meta.uid
    }

    fn notifier_type(&self) -> &str {
        WEBHOOK_TYPE
    }

    fn send_resolved(&self) -> bool {
        self.meta.send_resolved()
    }

    async fn notify(
        &self,
        ctx: &DeliveryContext,
        alerts: &AlertBatch,
    ) -> Result<bool, NotifyError> {
        let span = tracing::info_span!(
            "send_webhook",
            notifier_name = %self.meta.name,
            method = %self.config.method
        );

        async {
            if alerts.is_empty() {
                tracing::debug!("Empty alert batch, nothing to send");
                return Ok(false);
            }
            tracing::debug!(alert_count = alerts.len(), "Sending webhook notification");

            let data = TemplateData::new(&self.meta.name, alerts, self.templates.external_url());
            let mut expander = TemplateExpander::new(self.templates.as_ref(), &data);
            let title = expander.expand(&self.config.title_template);
            let message = expander.expand(&self.config.message_template);
            if let Some(err) = expander.into_error() {
                report_template_error(self.meta.info(), &err);
            }

            let payload = WebhookPayload::new(&data, title, message, self.config.max_alerts);
            let request = build_webhook_request(&payload, &self.config)
                .inspect_err(|e| report_payload_error(self.meta.info(), e))?;

            deliver(ctx, self.transport.as_ref(), &request, self.meta.info()).await
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("name", &self.meta.name)
            .field("method", &self.config.method)
            .field("send_resolved", &self.meta.send_resolved())
            .finish()
    }
}
