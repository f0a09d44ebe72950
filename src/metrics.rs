//! Metric descriptions.
//!
//! Counters are emitted through the `metrics` facade. No exporter is bundled:
//! the host process installs whichever recorder it uses.

/// Register all metric descriptions.
///
/// Call once at startup, after the recorder is installed. Without a
/// recorder this is a no-op.
pub fn register_metric_descriptions() {
    use metrics::describe_counter;

    describe_counter!(
        "alert_dispatch_notifications_sent_total",
        "Total number of notifications accepted by the transport"
    );
    describe_counter!(
        "alert_dispatch_notifications_failed_total",
        "Total number of notification attempts that failed (transport error, cancellation or deadline)"
    );
    describe_counter!(
        "alert_dispatch_template_errors_total",
        "Total number of notifications sent with a partially rendered message"
    );
    describe_counter!(
        "alert_dispatch_notifier_config_errors_total",
        "Total number of notifier configurations rejected at build time"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_descriptions_without_recorder_is_noop() {
        register_metric_descriptions();
        register_metric_descriptions();
    }
}
