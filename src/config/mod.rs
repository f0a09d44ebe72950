//! Notifier configuration: raw records, typed settings access, secrets,
//! and the YAML file loader.

mod channel;
mod env;
mod file;
mod secret;
mod settings;
pub(crate) mod validation;

pub use channel::NotifierConfig;
pub use env::resolve_env_vars;
pub use file::{ChannelsFile, DEFAULT_CONFIG_PATH};
pub use secret::{EnvSecretResolver, SecretResolver, SecretString, SecureSettings};
pub use settings::Settings;
