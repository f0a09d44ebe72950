//! Validation helpers shared by channel validators.

use minijinja::Environment;
use reqwest::Url;

use crate::error::ConfigError;

/// Validates Jinja template syntax of the setting `key`.
pub(crate) fn validate_template(key: &str, source: &str) -> Result<(), ConfigError> {
    let env = Environment::new();
    env.template_from_str(source)
        .map_err(|e| ConfigError::InvalidTemplate {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

/// Validates that the setting `key` holds an absolute http(s) URL.
pub(crate) fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidSetting {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidSetting {
            key: key.to_string(),
            message: format!("unsupported scheme '{}': only http and https are supported", scheme),
        }),
    }
}
