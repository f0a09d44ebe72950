//! Secret handling: redacted strings, the secure settings store, and the
//! resolver collaborator that decrypts secure settings.

use std::collections::HashMap;

use serde::Deserialize;

use super::env::resolve_env_vars;
use crate::error::SecretError;

/// Wrapper for secrets that never appears in logs.
///
/// `Debug` and `Display` always show `[REDACTED]` instead of the actual value.
///
/// # Example
///
/// ```
/// use alert_dispatch::config::SecretString;
///
/// let secret = SecretString::new("my-api-token".to_string());
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "my-api-token");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new `SecretString` from a regular `String`.
    pub fn new(s: String) -> Self {
        SecretString(s)
    }

    /// Exposes the underlying secret value.
    ///
    /// # Security Warning
    ///
    /// Use with care - never pass the result to logging functions
    /// or into template data.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString::new(s))
    }
}

/// Store of secure (encrypted-at-rest) settings for one notifier, keyed by
/// setting name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SecureSettings(HashMap<String, SecretString>);

impl SecureSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secure value, replacing any previous value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), SecretString::new(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decrypts secure settings for the channel validators.
///
/// `fallback` is the plaintext value found in the regular settings. It is
/// returned when the secure store has no value for `key`, so notifiers saved
/// before their secrets were encrypted keep working.
///
/// Closures with the matching signature implement this trait, which keeps
/// test doubles short:
///
/// ```
/// use alert_dispatch::config::{SecretResolver, SecretString, SecureSettings};
/// use alert_dispatch::error::SecretError;
///
/// let resolver = |_: &SecureSettings, _: &str, fallback: &str| -> Result<SecretString, SecretError> {
///     Ok(SecretString::new(fallback.to_string()))
/// };
/// let secret = resolver.decrypt(&SecureSettings::new(), "token", "plain").unwrap();
/// assert_eq!(secret.expose(), "plain");
/// ```
pub trait SecretResolver: Send + Sync {
    fn decrypt(
        &self,
        secure: &SecureSettings,
        key: &str,
        fallback: &str,
    ) -> Result<SecretString, SecretError>;
}

impl<F> SecretResolver for F
where
    F: Fn(&SecureSettings, &str, &str) -> Result<SecretString, SecretError> + Send + Sync,
{
    fn decrypt(
        &self,
        secure: &SecureSettings,
        key: &str,
        fallback: &str,
    ) -> Result<SecretString, SecretError> {
        self(secure, key, fallback)
    }
}

/// Resolver for secure settings stored as plaintext or as `${ENV_VAR}`
/// references, as found in YAML configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretResolver;

impl SecretResolver for EnvSecretResolver {
    fn decrypt(
        &self,
        secure: &SecureSettings,
        key: &str,
        fallback: &str,
    ) -> Result<SecretString, SecretError> {
        match secure.get(key) {
            Some(value) => resolve_env_vars(value.expose()).map(SecretString::new),
            None => Ok(SecretString::new(fallback.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn secret_string_redacts_in_debug_and_display() {
        let secret = SecretString::new("super-secret-token".to_string());

        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("super-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));

        let display_output = format!("{}", secret);
        assert!(!display_output.contains("super-secret-token"));
        assert!(display_output.contains("[REDACTED]"));

        assert_eq!(secret.expose(), "super-secret-token");
    }

    #[test]
    fn secure_settings_debug_never_leaks_values() {
        let secure = SecureSettings::new()
            .with("api_secret", "eyJhbGciOiJIUzI1NiJ9")
            .with("authorization_credentials", "hunter2");

        let debug = format!("{:?}", secure);
        assert!(debug.contains("api_secret"));
        assert!(!debug.contains("eyJ"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn secure_settings_deserializes_from_map() {
        let secure: SecureSettings =
            serde_json::from_value(serde_json::json!({"api_secret": "tok"})).unwrap();
        assert_eq!(secure.get("api_secret").unwrap().expose(), "tok");
        assert!(secure.get("missing").is_none());
    }

    #[test]
    fn env_resolver_prefers_secure_value_over_fallback() {
        let secure = SecureSettings::new().with("api_secret", "from-secure");
        let secret = EnvSecretResolver
            .decrypt(&secure, "api_secret", "from-settings")
            .unwrap();
        assert_eq!(secret.expose(), "from-secure");
    }

    #[test]
    fn env_resolver_uses_fallback_when_secure_value_missing() {
        let secret = EnvSecretResolver
            .decrypt(&SecureSettings::new(), "api_secret", "legacy-plaintext")
            .unwrap();
        assert_eq!(secret.expose(), "legacy-plaintext");
    }

    #[test]
    #[serial]
    fn env_resolver_expands_environment_references() {
        temp_env::with_var("TEST_WEBEX_TOKEN", Some("resolved-token"), || {
            let secure = SecureSettings::new().with("api_secret", "${TEST_WEBEX_TOKEN}");
            let secret = EnvSecretResolver.decrypt(&secure, "api_secret", "").unwrap();
            assert_eq!(secret.expose(), "resolved-token");
        });
    }

    #[test]
    #[serial]
    fn env_resolver_fails_on_undefined_variable() {
        temp_env::with_var("UNDEFINED_WEBEX_TOKEN", None::<&str>, || {
            let secure = SecureSettings::new().with("api_secret", "${UNDEFINED_WEBEX_TOKEN}");
            let err = EnvSecretResolver
                .decrypt(&secure, "api_secret", "")
                .unwrap_err();
            assert!(err.to_string().contains("UNDEFINED_WEBEX_TOKEN"));
        });
    }
}
