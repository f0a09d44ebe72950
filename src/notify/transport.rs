//! Outbound webhook messages and the transport that delivers them.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use super::DeliveryContext;
use crate::config::SecretString;
use crate::error::TransportError;

/// A fully built HTTP request, ready for delivery.
///
/// The URL is kept secret because incoming-webhook URLs embed their access
/// token. Authorization headers are marked sensitive.
#[derive(Clone)]
pub struct WebhookMessage {
    pub url: SecretString,
    pub method: Method,
    pub content_type: &'static str,
    pub headers: HeaderMap,
    pub body: String,
}

impl std::fmt::Debug for WebhookMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the URL. HeaderMap's Debug prints "Sensitive" for
        // values flagged as such.
        f.debug_struct("WebhookMessage")
            .field("method", &self.method.as_str())
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Delivers webhook messages.
///
/// Implementations decide what counts as success (e.g. which status codes).
/// They are called once per attempt and must not retry.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn send(
        &self,
        ctx: &DeliveryContext,
        message: &WebhookMessage,
    ) -> Result<(), TransportError>;
}

/// [`WebhookTransport`] over a shared `reqwest::Client`.
///
/// Any 2xx status is a success. The remaining time of the context, if any,
/// becomes the request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport using `client` (shared for connection pooling).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(
        &self,
        ctx: &DeliveryContext,
        message: &WebhookMessage,
    ) -> Result<(), TransportError> {
        let mut request = self
            .client
            .request(message.method.clone(), message.url.expose())
            .headers(message.headers.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(message.content_type))
            .body(message.body.clone());

        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        // reqwest errors may embed the URL, which can carry a token.
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(status = %status, "Webhook accepted");
            Ok(())
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
            })
        }
    }
}
