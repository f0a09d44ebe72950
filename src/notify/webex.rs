//! Cisco Webex notifier.
//!
//! Three generations of Webex settings are supported:
//!
//! - **V1**: legacy incoming webhook (`webhook_url`, template in `content`),
//!   three-state symbols including no-data.
//! - **V2**: incoming webhook (`webhook_url`, template in `message`).
//! - **V3**: authenticated room API (`url`, `room_id`, secret `api_secret`).
//!
//! Incoming webhooks receive `{"markdown": ...}`. The room API receives
//! `{"roomId": ..., "markdown": ...}` with a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::Instrument;

use super::payload::{bearer_headers, json_request};
use super::registry::{ChannelDescriptor, ChannelOption, FactoryConfig};
use super::{
    DeliveryContext, Notifier, NotifierMeta, WebhookMessage, WebhookTransport, deliver,
    report_payload_error, report_template_error,
};
use crate::alert::AlertBatch;
use crate::config::validation::{validate_http_url, validate_template};
use crate::config::{NotifierConfig, SecretResolver, SecretString};
use crate::error::{ConfigError, NotifyError};
use crate::images::ImageStore;
use crate::message::{RenderContext, StateSymbols, render_message};
use crate::template::TemplateRenderer;

/// Channel type name.
pub const WEBEX_TYPE: &str = "webex";

/// Messages endpoint of the public Webex API.
pub const DEFAULT_WEBEX_API_URL: &str = "https://webexapis.com/v1/messages";

/// Message template used when none is configured.
pub const DEFAULT_WEBEX_MESSAGE: &str = r#"{% include "default.message" %}"#;

const WEBEX_OPTIONS: &[ChannelOption] = &[
    ChannelOption {
        property_name: "webhook_url",
        label: "Incoming Webhook URL",
        required: true,
        secure: false,
        schema_versions: &[1, 2],
    },
    ChannelOption {
        property_name: "content",
        label: "Message Template",
        required: false,
        secure: false,
        schema_versions: &[1],
    },
    ChannelOption {
        property_name: "message",
        label: "Message Template",
        required: false,
        secure: false,
        schema_versions: &[2, 3],
    },
    ChannelOption {
        property_name: "url",
        label: "API URL",
        required: false,
        secure: false,
        schema_versions: &[3],
    },
    ChannelOption {
        property_name: "room_id",
        label: "Room ID",
        required: true,
        secure: false,
        schema_versions: &[3],
    },
    ChannelOption {
        property_name: "api_secret",
        label: "Bot Token",
        required: true,
        secure: true,
        schema_versions: &[3],
    },
];

/// Descriptor registering the Webex channel.
pub const WEBEX_CHANNEL: ChannelDescriptor = ChannelDescriptor {
    channel_type: WEBEX_TYPE,
    name: "Cisco Webex",
    description: "Sends notifications to a Cisco Webex space",
    factory: webex_factory,
    options: WEBEX_OPTIONS,
};

/// Version of the Webex settings schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebexSchema {
    V1,
    V2,
    V3,
}

impl WebexSchema {
    /// Schema named by `schema_version`, or inferred from the settings.
    pub fn detect(config: &NotifierConfig) -> Result<Self, ConfigError> {
        match config.schema_version {
            Some(1) => Ok(WebexSchema::V1),
            Some(2) => Ok(WebexSchema::V2),
            Some(3) => Ok(WebexSchema::V3),
            Some(other) => Err(ConfigError::InvalidSetting {
                key: "schema_version".to_string(),
                message: format!("unsupported webex schema version {}", other),
            }),
            None => {
                let settings = config.settings();
                let present = |key: &str| !settings.string(key).trim().is_empty();
                let has_secret = config
                    .secure_settings
                    .get("api_secret")
                    .is_some_and(|secret| !secret.expose().trim().is_empty());
                if present("room_id") || present("url") || has_secret {
                    Ok(WebexSchema::V3)
                } else if present("content") {
                    Ok(WebexSchema::V1)
                } else {
                    Ok(WebexSchema::V2)
                }
            }
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            WebexSchema::V1 => "content",
            WebexSchema::V2 | WebexSchema::V3 => "message",
        }
    }

    fn default_symbols(&self) -> StateSymbols {
        match self {
            WebexSchema::V1 => StateSymbols::three_state(),
            WebexSchema::V2 | WebexSchema::V3 => StateSymbols::two_state(),
        }
    }
}

/// Where Webex messages are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebexTarget {
    /// Incoming webhook. The URL embeds the access token.
    IncomingWebhook { url: SecretString },
    /// Room messages API, authenticated with a bot token.
    Room {
        url: SecretString,
        room_id: String,
        token: SecretString,
    },
}

/// Validated Webex configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebexConfig {
    pub schema: WebexSchema,
    pub target: WebexTarget,
    pub message_template: String,
    pub symbols: StateSymbols,
}

impl WebexConfig {
    /// Validate `config` and resolve its secrets.
    ///
    /// Keys are checked in the order they are used: endpoint, room, token,
    /// then the message template.
    pub fn from_settings(
        config: &NotifierConfig,
        secrets: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let schema = WebexSchema::detect(config)?;
        let settings = config.settings();

        let target = match schema {
            WebexSchema::V1 | WebexSchema::V2 => {
                let url = settings.required("webhook_url")?;
                validate_http_url("webhook_url", &url)?;
                WebexTarget::IncomingWebhook {
                    url: SecretString::new(url),
                }
            }
            WebexSchema::V3 => {
                let url = settings.string_or("url", DEFAULT_WEBEX_API_URL);
                validate_http_url("url", &url)?;
                let room_id = settings.required("room_id")?;
                let token = secrets.decrypt(
                    &config.secure_settings,
                    "api_secret",
                    &settings.string("api_secret"),
                )?;
                if token.expose().trim().is_empty() {
                    return Err(ConfigError::MissingSecret {
                        key: "api_secret".to_string(),
                    });
                }
                bearer_headers(&token).map_err(|_| ConfigError::InvalidSetting {
                    key: "api_secret".to_string(),
                    message: "token contains characters not allowed in an HTTP header".to_string(),
                })?;
                WebexTarget::Room {
                    url: SecretString::new(url),
                    room_id,
                    token,
                }
            }
        };

        let message_key = schema.message_key();
        let message_template = settings.string_or(message_key, DEFAULT_WEBEX_MESSAGE);
        validate_template(message_key, &message_template)?;

        let symbols = settings
            .object::<StateSymbols>("state_symbols")?
            .unwrap_or_else(|| schema.default_symbols());

        Ok(Self {
            schema,
            target,
            message_template,
            symbols,
        })
    }
}

#[derive(Debug, Serialize)]
struct WebexPayload<'a> {
    #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
    room_id: Option<&'a str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    markdown: &'a str,
}

/// Build the Webex request carrying `message`.
///
/// An empty message produces a payload without `markdown`.
pub fn build_webex_request(
    message: &str,
    target: &WebexTarget,
) -> Result<WebhookMessage, NotifyError> {
    match target {
        WebexTarget::IncomingWebhook { url } => json_request(
            url,
            Method::POST,
            &WebexPayload {
                room_id: None,
                markdown: message,
            },
            HeaderMap::new(),
        ),
        WebexTarget::Room {
            url,
            room_id,
            token,
        } => json_request(
            url,
            Method::POST,
            &WebexPayload {
                room_id: Some(room_id),
                markdown: message,
            },
            bearer_headers(token)?,
        ),
    }
}

/// Webex notifier.
pub struct WebexNotifier {
    meta: NotifierMeta,
    config: WebexConfig,
    images: Arc<dyn ImageStore>,
    transport: Arc<dyn WebhookTransport>,
    templates: Arc<dyn TemplateRenderer>,
}

impl WebexNotifier {
    pub fn new(
        meta: NotifierMeta,
        config: WebexConfig,
        images: Arc<dyn ImageStore>,
        transport: Arc<dyn WebhookTransport>,
        templates: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            meta,
            config,
            images,
            transport,
            templates,
        }
    }

    pub fn config(&self) -> &WebexConfig {
        &self.config
    }
}

/// Factory registered for the `webex` channel type.
pub fn webex_factory(fc: FactoryConfig<'_>) -> Result<Arc<dyn Notifier>, ConfigError> {
    let config = WebexConfig::from_settings(fc.config, fc.collaborators.secrets.as_ref())?;
    Ok(Arc::new(WebexNotifier::new(
        NotifierMeta::from_config(fc.config),
        config,
        fc.collaborators.images.clone(),
        fc.collaborators.transport.clone(),
        fc.collaborators.templates.clone(),
    )))
}

#[async_trait]
impl Notifier for WebexNotifier {
    fn name(&self) -> &str {
        &self.meta.name
    }

    fn uid(&self) -> &str {
        &self.meta.uid
    }

    fn notifier_type(&self) -> &str {
        WEBEX_TYPE
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
            "send_webex",
            notifier_name = %self.meta.name,
            schema = ?self.config.schema
        );

        async {
            if alerts.is_empty() {
                tracing::debug!("Empty alert batch, nothing to send");
                return Ok(false);
            }
            tracing::debug!(alert_count = alerts.len(), "Sending webex notification");

            let render_ctx = RenderContext {
                templates: self.templates.as_ref(),
                images: self.images.as_ref(),
                symbols: &self.config.symbols,
                receiver: &self.meta.name,
            };
            let rendered = render_message(&render_ctx, alerts, &self.config.message_template).await;
            if let Some(err) = &rendered.template_error {
                report_template_error(self.meta.info(), err);
            }

            let request = build_webex_request(&rendered.message.text(), &self.config.target)
                .inspect_err(|e| report_payload_error(self.meta.info(), e))?;
            tracing::trace!(body_len = request.body.len(), "Request body built");

            deliver(ctx, self.transport.as_ref(), &request, self.meta.info()).await
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for WebexNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose URLs or tokens in debug output.
        f.debug_struct("WebexNotifier")
            .field("name", &self.meta.name)
            .field("schema", &self.config.schema)
            .field("send_resolved", &self.meta.send_resolved())
            .finish()
    }
}
