//! Shared helpers for building JSON webhook requests.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;

use super::WebhookMessage;
use crate::config::SecretString;
use crate::error::NotifyError;

/// Content type of every JSON payload.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Serialize `payload` into a JSON request for `url`.
///
/// Serialization of string-only payloads cannot fail in practice. If it
/// does, the attempt is aborted with [`NotifyError::Payload`].
pub fn json_request<T: Serialize>(
    url: &SecretString,
    method: Method,
    payload: &T,
    headers: HeaderMap,
) -> Result<WebhookMessage, NotifyError> {
    let body = serde_json::to_string(payload)
        .map_err(|e| NotifyError::Payload(format!("JSON serialization error: {}", e)))?;

    Ok(WebhookMessage {
        url: url.clone(),
        method,
        content_type: CONTENT_TYPE_JSON,
        headers,
        body,
    })
}

/// Headers carrying `Authorization: <scheme> <credentials>`.
///
/// The value is flagged sensitive so it never shows up in debug output.
pub fn authorization_headers(
    scheme: &str,
    credentials: &SecretString,
) -> Result<HeaderMap, NotifyError> {
    let mut value = HeaderValue::from_str(&format!("{} {}", scheme, credentials.expose()))
        .map_err(|_| NotifyError::Payload("invalid characters in authorization header".to_string()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Headers carrying `Authorization: Bearer <token>`.
pub fn bearer_headers(token: &SecretString) -> Result<HeaderMap, NotifyError> {
    authorization_headers("Bearer", token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        text: &'static str,
    }

    #[test]
    fn json_request_sets_content_type_and_body() {
        let url = SecretString::new("https://example.test/hook".to_string());
        let message =
            json_request(&url, Method::POST, &Sample { text: "hi" }, HeaderMap::new()).unwrap();

        assert_eq!(message.content_type, CONTENT_TYPE_JSON);
        assert_eq!(message.body, r#"{"text":"hi"}"#);
        assert_eq!(message.method, Method::POST);
        assert_eq!(message.url.expose(), "https://example.test/hook");
        assert!(message.headers.is_empty());
    }

    #[test]
    fn bearer_headers_hold_exactly_the_token() {
        let headers = bearer_headers(&SecretString::new("tok".to_string())).unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();

        assert_eq!(value.to_str().unwrap(), "Bearer tok");
        assert!(value.is_sensitive());
    }

    #[test]
    fn authorization_headers_reject_control_characters() {
        let result = authorization_headers("Bearer", &SecretString::new("bad\ntoken".to_string()));
        assert!(matches!(result, Err(NotifyError::Payload(_))));
    }
}
