//! Centralized error types for alert-dispatch using thiserror.
//!
//! Only [`ConfigError`] and [`NotifyError`] cross the notifier boundary.
//! Template and image errors are absorbed by the renderer and only logged.

use thiserror::Error;

/// Errors raised while validating a notifier configuration.
///
/// A notifier whose configuration fails with one of these is never built
/// and never registered.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("could not find {key} property in settings")]
    MissingSetting { key: String },
    #[error("could not find {key} property in secure settings or settings")]
    MissingSecret { key: String },
    #[error("invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },
    #[error("invalid template in {key}: {message}")]
    InvalidTemplate { key: String, message: String },
    #[error(transparent)]
    SecretResolution(#[from] SecretError),
    #[error("unknown channel type '{0}'")]
    UnknownChannel(String),
    #[error("channel type '{0}' already registered")]
    DuplicateChannel(String),
    #[error("notifier '{0}' already registered")]
    DuplicateNotifier(String),
    #[error("invalid notifier '{name}': {message}")]
    InvalidNotifier { name: String, message: String },
}

/// Errors returned by a [`crate::config::SecretResolver`].
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("failed to decrypt secure setting '{key}': {message}")]
    Decrypt { key: String, message: String },
    #[error("undefined environment variable{}: {}", plural(.0), .0.join(", "))]
    UndefinedEnvVars(Vec<String>),
}

fn plural(names: &[String]) -> &'static str {
    if names.len() > 1 { "s" } else { "" }
}

/// Errors related to template rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors raised by an image store. Never surfaced past the renderer.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image '{0}' not found")]
    NotFound(String),
    #[error("image store unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a [`crate::notify::WebhookTransport`].
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status code {status}")]
    Status { status: u16 },
}

/// Errors that end a single notification attempt.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to send notification: {0}")]
    Transport(#[from] TransportError),
    #[error("notification cancelled")]
    Cancelled,
    #[error("notification deadline exceeded")]
    DeadlineExceeded,
    #[error("failed to build payload: {0}")]
    Payload(String),
}
