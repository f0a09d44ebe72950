//! Integration tests for Webex notification sending.
//!
//! Uses wiremock to simulate the Webex incoming-webhook and messages APIs.

use std::sync::Arc;
use std::time::Duration;

use alert_dispatch::alert::{Alert, AlertBatch, NO_DATA_ALERT_NAME};
use alert_dispatch::config::{NotifierConfig, SecureSettings};
use alert_dispatch::error::{NotifyError, TransportError};
use alert_dispatch::notify::{
    ChannelRegistry, Collaborators, DeliveryContext, HttpTransport, Notifier, NotifierRegistry,
};
use alert_dispatch::template::JinjaTemplates;
use serde_json::{Value, json};
use serial_test::serial;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create client")
}

fn collaborators(template: Option<(&str, &str)>) -> Collaborators {
    let mut templates = JinjaTemplates::new("https://grafana.test/");
    if let Some((name, source)) = template {
        templates = templates.with_template(name, source).unwrap();
    }
    Collaborators::new(Arc::new(templates))
        .with_transport(Arc::new(HttpTransport::new(make_client())))
}

fn build(config: NotifierConfig, collaborators: Collaborators) -> Arc<dyn Notifier> {
    let name = config.name.clone();
    let registry = NotifierRegistry::from_config(
        &[config],
        &ChannelRegistry::with_builtin_channels(),
        collaborators,
    )
    .unwrap();
    registry.get(&name).unwrap()
}

fn firing_batch() -> AlertBatch {
    AlertBatch::new(vec![Alert::firing().with_label("alertname", "HighCPU")])
}

async fn received_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn incoming_webhook_receives_markdown_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/webhooks/incoming/abc"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_json(json!({"markdown": "\u{26A0}\u{FE0F} Firing\n\n*Message:*\nFiring\n*URL:* https://grafana.test/alerting/list\n"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({
            "webhook_url": format!("{}/v1/webhooks/incoming/abc", mock_server.uri()),
            "message": "Firing"
        }));
    let notifier = build(
        config,
        collaborators(Some(("default.title", "Firing"))),
    );

    let delivered = notifier
        .notify(&DeliveryContext::new(), &firing_batch())
        .await
        .unwrap();
    assert!(delivered);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn room_api_receives_room_id_and_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-room", "webex").with_settings(json!({
        "url": format!("{}/v1/messages", mock_server.uri()),
        "room_id": "R1",
        "api_secret": "tok"
    }));
    let notifier = build(config, collaborators(None));

    assert!(
        notifier
            .notify(&DeliveryContext::new(), &firing_batch())
            .await
            .unwrap()
    );

    let body = received_body(&mock_server).await;
    assert_eq!(body["roomId"], "R1");
    let markdown = body["markdown"].as_str().unwrap();
    assert!(markdown.starts_with("\u{26A0}\u{FE0F} [FIRING:1] HighCPU"));
    assert!(!markdown.contains("tok"));
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn secure_token_from_environment_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer env-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-room", "webex")
        .with_settings(json!({"url": mock_server.uri(), "room_id": "R1"}))
        .with_secure_settings(SecureSettings::new().with("api_secret", "${WEBEX_TEST_TOKEN}"));

    let notifier = temp_env::with_var("WEBEX_TEST_TOKEN", Some("env-token"), || {
        build(config, collaborators(None))
    });

    assert!(
        notifier
            .notify(&DeliveryContext::new(), &firing_batch())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn server_error_is_returned_as_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({"webhook_url": mock_server.uri()}));
    let notifier = build(config, collaborators(None));

    let result = notifier
        .notify(&DeliveryContext::new(), &firing_batch())
        .await;

    assert!(matches!(
        result,
        Err(NotifyError::Transport(TransportError::Status { status: 500 }))
    ));
}

#[tokio::test]
async fn unreachable_endpoint_error_hides_url() {
    // Port 1 is never listening.
    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({"webhook_url": "http://127.0.0.1:1/hooks/secret-token-in-path"}));
    let notifier = build(config, collaborators(None));

    let err = notifier
        .notify(&DeliveryContext::new(), &firing_batch())
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Transport(TransportError::Request(_))));
    assert!(!err.to_string().contains("secret-token-in-path"));
}

#[tokio::test]
async fn slow_endpoint_hits_deadline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({"webhook_url": mock_server.uri()}));
    let notifier = build(config, collaborators(None));

    let ctx = DeliveryContext::new().with_timeout(Duration::from_millis(100));
    let result = notifier.notify(&ctx, &firing_batch()).await;

    assert!(matches!(result, Err(NotifyError::DeadlineExceeded)));
}

#[tokio::test]
async fn cancelled_context_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({"webhook_url": mock_server.uri()}));
    let notifier = build(config, collaborators(None));

    let token = CancellationToken::new();
    token.cancel();
    let ctx = DeliveryContext::new().with_cancellation(token);

    let result = notifier.notify(&ctx, &firing_batch()).await;
    assert!(matches!(result, Err(NotifyError::Cancelled)));
}

#[tokio::test]
async fn legacy_schema_marks_no_data_alerts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-legacy", "webex").with_settings(json!({
        "webhook_url": mock_server.uri(),
        "content": "{{ common_labels.alertname }}"
    }));
    let notifier = build(config, collaborators(None));

    let batch = AlertBatch::new(vec![
        Alert::firing().with_label("alertname", NO_DATA_ALERT_NAME),
    ]);
    notifier
        .notify(&DeliveryContext::new(), &batch)
        .await
        .unwrap();

    let body = received_body(&mock_server).await;
    let markdown = body["markdown"].as_str().unwrap();
    assert!(markdown.starts_with("\u{2753}\u{FE0F} "));
    assert!(markdown.contains("*Message:*\nDatasourceNoData\n"));
}

#[tokio::test]
async fn resolved_batch_uses_resolved_symbol() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = NotifierConfig::new("webex-hook", "webex")
        .with_settings(json!({"webhook_url": mock_server.uri()}));
    let notifier = build(config, collaborators(None));

    let batch = AlertBatch::new(vec![Alert::resolved().with_label("alertname", "HighCPU")]);
    notifier
        .notify(&DeliveryContext::new(), &batch)
        .await
        .unwrap();

    let body = received_body(&mock_server).await;
    assert!(
        body["markdown"]
            .as_str()
            .unwrap()
            .starts_with("\u{2705} [RESOLVED] HighCPU")
    );
}
