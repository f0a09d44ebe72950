//! End-to-end notifier scenarios over an in-memory transport.

use std::sync::{Arc, Mutex};

use alert_dispatch::alert::{Alert, AlertBatch};
use alert_dispatch::config::{EnvSecretResolver, NotifierConfig};
use alert_dispatch::error::{ConfigError, NotifyError, TransportError};
use alert_dispatch::notify::webex::build_webex_request;
use alert_dispatch::notify::{
    ChannelRegistry, Collaborators, DeliveryContext, Notifier, NotifierRegistry, WebexConfig,
    WebhookMessage, WebhookTransport,
};
use alert_dispatch::template::JinjaTemplates;
use async_trait::async_trait;
use serde_json::json;

/// Records messages, or fails every send when `fail` is set.
#[derive(Default)]
struct FakeTransport {
    fail: bool,
    sent: Mutex<Vec<WebhookMessage>>,
}

impl FakeTransport {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookTransport for FakeTransport {
    async fn send(
        &self,
        _ctx: &DeliveryContext,
        message: &WebhookMessage,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            Err(TransportError::Request("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn collaborators(transport: Arc<FakeTransport>) -> Collaborators {
    Collaborators::new(Arc::new(JinjaTemplates::new("https://grafana.test")))
        .with_transport(transport)
}

fn registry(configs: &[NotifierConfig], transport: Arc<FakeTransport>) -> NotifierRegistry {
    NotifierRegistry::from_config(
        configs,
        &ChannelRegistry::with_builtin_channels(),
        collaborators(transport),
    )
    .unwrap()
}

#[test]
fn scenario_a_empty_settings_name_webhook_url() {
    let config = NotifierConfig::new("ops", "webex").with_settings(json!({}));

    let err = WebexConfig::from_settings(&config, &EnvSecretResolver).unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not find webhook_url property in settings"
    );

    let errors = NotifierRegistry::from_config(
        &[config],
        &ChannelRegistry::with_builtin_channels(),
        collaborators(Arc::default()),
    )
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ConfigError::InvalidNotifier { message, .. } if message.contains("webhook_url")));
}

#[test]
fn scenario_b_incoming_webhook_payload() {
    let config = NotifierConfig::new("ops", "webex")
        .with_settings(json!({"webhook_url": "https://example.test/hook"}));
    let resolved = WebexConfig::from_settings(&config, &EnvSecretResolver).unwrap();

    let request = build_webex_request("Firing", &resolved.target).unwrap();
    assert_eq!(request.body, r#"{"markdown":"Firing"}"#);
    assert!(request.headers.get("authorization").is_none());
    assert_eq!(request.url.expose(), "https://example.test/hook");
}

#[test]
fn scenario_c_room_payload_and_bearer_header() {
    let config = NotifierConfig::new("ops", "webex").with_settings(json!({
        "url": "https://example.test",
        "room_id": "R1",
        "api_secret": "tok"
    }));
    let resolved = WebexConfig::from_settings(&config, &EnvSecretResolver).unwrap();

    let request = build_webex_request("<text>", &resolved.target).unwrap();
    assert_eq!(request.body, r#"{"roomId":"R1","markdown":"<text>"}"#);
    assert_eq!(
        request.headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer tok"
    );
}

#[tokio::test]
async fn scenario_d_transport_error_is_returned() {
    let transport = Arc::new(FakeTransport::failing());
    let config = NotifierConfig::new("ops", "webex")
        .with_settings(json!({"webhook_url": "https://example.test/hook"}));
    let registry = registry(&[config], transport.clone());

    let batch = AlertBatch::new(vec![Alert::firing()]);
    let result = registry
        .get("ops")
        .unwrap()
        .notify(&DeliveryContext::new(), &batch)
        .await;

    assert!(matches!(
        result,
        Err(NotifyError::Transport(TransportError::Request(_)))
    ));
    assert_eq!(transport.count(), 1);
}

#[tokio::test]
async fn scenario_e_resolved_batch_is_suppressed_by_caller() {
    let transport = Arc::new(FakeTransport::default());
    let configs = [
        NotifierConfig::new("quiet", "webex")
            .with_settings(json!({"webhook_url": "https://example.test/quiet"}))
            .with_disable_resolve_message(true),
        NotifierConfig::new("loud", "webex")
            .with_settings(json!({"webhook_url": "https://example.test/loud"})),
    ];
    let registry = registry(&configs, transport.clone());

    let quiet = registry.get("quiet").unwrap();
    assert!(!quiet.send_resolved());
    assert!(registry.get("loud").unwrap().send_resolved());

    let resolved = AlertBatch::new(vec![Alert::resolved(), Alert::resolved()]);
    let outcomes = registry
        .notify_all(&DeliveryContext::new(), &resolved)
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, "loud");
    assert!(matches!(outcomes[0].1, Ok(true)));

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.expose(), "https://example.test/loud");
}

#[tokio::test]
async fn firing_batch_reaches_suppressed_notifiers() {
    let transport = Arc::new(FakeTransport::default());
    let configs = [NotifierConfig::new("quiet", "webex")
        .with_settings(json!({"webhook_url": "https://example.test/quiet"}))
        .with_disable_resolve_message(true)];
    let registry = registry(&configs, transport.clone());

    let mixed = AlertBatch::new(vec![Alert::firing(), Alert::resolved()]);
    let outcomes = registry.notify_all(&DeliveryContext::new(), &mixed).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(transport.count(), 1);
}

#[test]
fn send_resolved_is_negation_of_disable_flag() {
    for disable in [false, true] {
        let config = NotifierConfig::new("hook", "webhook")
            .with_settings(json!({"url": "https://example.test/in"}))
            .with_disable_resolve_message(disable);
        let registry = registry(&[config], Arc::default());
        let notifier: Arc<dyn Notifier> = registry.get("hook").unwrap();
        assert_eq!(notifier.send_resolved(), !disable);
    }
}
