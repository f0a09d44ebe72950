//! Typed access to the raw, untyped settings of a notifier.
//!
//! Validators read every key through [`Settings`] so that coercion and
//! missing-key errors behave the same for every channel.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Read-only view over a notifier's raw settings map.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a> {
    raw: &'a Map<String, Value>,
}

impl<'a> Settings<'a> {
    pub fn new(raw: &'a Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    /// Value of `key` coerced to a string.
    ///
    /// Strings are returned as-is, numbers and booleans are formatted, and
    /// anything else (missing, null, arrays, objects) yields an empty string.
    pub fn string(&self, key: &str) -> String {
        match self.raw.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Value of `key` trimmed of surrounding whitespace, or `default` when the
    /// coerced value is empty.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        let value = self.string(key);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            default.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Value of `key`, failing with [`ConfigError::MissingSetting`] when it is
    /// missing or blank.
    pub fn required(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.string(key);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingSetting {
                key: key.to_string(),
            });
        }
        Ok(trimmed.to_string())
    }

    /// Deserialize a structured value under `key`, or `None` when absent.
    pub fn object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.raw.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ConfigError::InvalidSetting {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    /// Positive integer under `key`, or `None` when absent or zero.
    pub fn positive_integer(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        match self.raw.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => Ok(None),
                Some(v) => usize::try_from(v).map(Some).map_err(|_| {
                    ConfigError::InvalidSetting {
                        key: key.to_string(),
                        message: format!("{} is out of range", v),
                    }
                }),
                None => Err(ConfigError::InvalidSetting {
                    key: key.to_string(),
                    message: format!("expected a positive integer, got {}", n),
                }),
            },
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<usize>()
                .map(|v| (v > 0).then_some(v))
                .map_err(|_| ConfigError::InvalidSetting {
                    key: key.to_string(),
                    message: format!("expected a positive integer, got '{}'", s),
                }),
            Some(other) => Err(ConfigError::InvalidSetting {
                key: key.to_string(),
                message: format!("expected a positive integer, got {}", other),
            }),
        }
    }
}
