//! Command-line interface for alert-dispatch using clap.
//!
//! The binary validates a notifier configuration file and sends test
//! notifications through the configured channels.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::alert::{Alert, AlertBatch};
use crate::config::DEFAULT_CONFIG_PATH;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format for journalctl (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Validate alert notifiers and send test notifications.
#[derive(Parser, Debug)]
#[command(name = "alert-dispatch")]
#[command(version)]
#[command(about = "Validate alert notifiers and send test notifications")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Validate configuration and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Send the test notification to this notifier only.
    #[arg(long = "notifier")]
    pub notifier: Option<String>,

    /// Send the test alert as resolved instead of firing.
    #[arg(long = "resolved")]
    pub resolved: bool,

    /// Delivery deadline in seconds.
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout: u64,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Batch holding the single alert sent by a notifier test.
pub fn test_notification_batch(resolved: bool) -> AlertBatch {
    let alert = if resolved {
        Alert::resolved()
    } else {
        Alert::firing()
    };
    AlertBatch::new(vec![
        alert
            .with_label("alertname", "TestAlert")
            .with_label("instance", "Grafana")
            .with_annotation("summary", "Notification test"),
    ])
}
