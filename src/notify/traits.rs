//! Notifier trait definition.

use async_trait::async_trait;

use super::DeliveryContext;
use crate::alert::AlertBatch;
use crate::error::NotifyError;

/// A configured destination for alert notifications.
///
/// Implementations must be `Send + Sync` and hold no per-call mutable
/// state. The engine calls many notifiers concurrently, and the same
/// notifier for several rules at once.
///
/// # Example
///
/// ```ignore
/// use alert_dispatch::notify::{DeliveryContext, Notifier};
///
/// struct MyNotifier { name: String }
///
/// #[async_trait]
/// impl Notifier for MyNotifier {
///     fn name(&self) -> &str { &self.name }
///     fn uid(&self) -> &str { &self.name }
///     fn notifier_type(&self) -> &str { "my_type" }
///     fn send_resolved(&self) -> bool { true }
///     async fn notify(&self, ctx: &DeliveryContext, alerts: &AlertBatch) -> Result<bool, NotifyError> {
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable name of this notifier instance (e.g., "webex-ops").
    fn name(&self) -> &str;

    /// Unique identifier of this notifier instance.
    fn uid(&self) -> &str;

    /// Channel type of the notifier (e.g., "webex", "webhook").
    fn notifier_type(&self) -> &str;

    /// Whether resolved notifications should be sent to this notifier.
    ///
    /// Always the negation of the configured `disable_resolve_message`.
    /// The engine checks this before notifying a resolved batch.
    fn send_resolved(&self) -> bool;

    /// Render and deliver `alerts`.
    ///
    /// Makes a single delivery attempt. Retries are the caller's business.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The notification was delivered
    /// * `Ok(false)` - Nothing to deliver (empty batch)
    /// * `Err(NotifyError)` - The attempt failed
    async fn notify(&self, ctx: &DeliveryContext, alerts: &AlertBatch)
    -> Result<bool, NotifyError>;
}

impl std::fmt::Debug for dyn Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("name", &self.name())
            .field("uid", &self.uid())
            .field("type", &self.notifier_type())
            .field("send_resolved", &self.send_resolved())
            .finish()
    }
}
