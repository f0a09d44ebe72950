//! Environment variable substitution for secure settings.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SecretError;

static ENV_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Resolves `${VAR_NAME}` patterns in a string.
///
/// Every undefined variable is reported, not just the first one.
pub fn resolve_env_vars(value: &str) -> Result<String, SecretError> {
    let mut missing = Vec::new();

    let resolved = ENV_VAR_REGEX.replace_all(value, |caps: &regex::Captures<'_>| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(var_value) => var_value,
            Err(_) => {
                missing.push(var_name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(resolved.into_owned())
    } else {
        Err(SecretError::UndefinedEnvVars(missing))
    }
}
