//! Delivery executor: one transport call per attempt, with uniform outcome
//! handling for every channel.

use super::{DeliveryContext, WebhookMessage, WebhookTransport};
use crate::error::NotifyError;

/// Identity of the notifier performing a delivery, for logs and metrics.
#[derive(Debug, Clone, Copy)]
pub struct NotifierInfo<'a> {
    pub name: &'a str,
    pub notifier_type: &'a str,
}

/// Deliver `message` through `transport`.
///
/// The transport is called exactly once. The call is abandoned as soon as
/// the context is cancelled or its deadline passes.
///
/// # Returns
///
/// * `Ok(true)` - The transport accepted the message
/// * `Err(NotifyError)` - Transport failure, cancellation or deadline
pub async fn deliver(
    ctx: &DeliveryContext,
    transport: &dyn WebhookTransport,
    message: &WebhookMessage,
    notifier: NotifierInfo<'_>,
) -> Result<bool, NotifyError> {
    if let Some(err) = ctx.err() {
        record_failure(notifier, &err);
        return Err(err);
    }

    let result = tokio::select! {
        biased;
        err = ctx.done() => Err(err),
        sent = transport.send(ctx, message) => sent.map_err(NotifyError::from),
    };

    match result {
        Ok(()) => {
            tracing::debug!(
                notifier_name = %notifier.name,
                notifier_type = %notifier.notifier_type,
                "Notification delivered"
            );
            metrics::counter!(
                "alert_dispatch_notifications_sent_total",
                "notifier_name" => notifier.name.to_string(),
                "notifier_type" => notifier.notifier_type.to_string()
            )
            .increment(1);
            Ok(true)
        }
        Err(err) => {
            record_failure(notifier, &err);
            Err(err)
        }
    }
}

fn record_failure(notifier: NotifierInfo<'_>, err: &NotifyError) {
    tracing::error!(
        notifier_name = %notifier.name,
        notifier_type = %notifier.notifier_type,
        error = %err,
        "Failed to send notification"
    );
    metrics::counter!(
        "alert_dispatch_notifications_failed_total",
        "notifier_name" => notifier.name.to_string(),
        "notifier_type" => notifier.notifier_type.to_string()
    )
    .increment(1);
}
