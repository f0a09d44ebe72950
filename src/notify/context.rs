//! Caller-supplied cancellation and deadline for one notification attempt.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::NotifyError;

/// Cancellation token and optional deadline propagated to delivery.
///
/// Cloning is cheap. Clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct DeliveryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl DeliveryContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cancel` as the cancellation source.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Expire the context `timeout` from now. An earlier deadline is kept.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire the context at `deadline`. An earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Error describing why the context is done, if it is.
    pub fn err(&self) -> Option<NotifyError> {
        if self.cancel.is_cancelled() {
            Some(NotifyError::Cancelled)
        } else if self.remaining().is_some_and(|r| r.is_zero()) {
            Some(NotifyError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes, with
    /// the matching error.
    pub async fn done(&self) -> NotifyError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => NotifyError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => NotifyError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                NotifyError::Cancelled
            }
        }
    }
}
