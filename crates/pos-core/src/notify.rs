//! Outbound notification seam.
//!
//! Writers hand notifications to a [`Notifier`] after their changes are
//! durable. Delivery is best-effort: a notifier failure is reported to the
//! caller but never undoes the write.

use thiserror::Error;

/// Failure to hand a notification to its channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification could not be encoded for the wire.
    #[error("notification encoding failed: {0}")]
    Encoding(String),

    /// The channel is closed or otherwise unavailable.
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Sink for notifications of type `N`.
pub trait Notifier<N>: Send + Sync {
    /// Publishes `notification`, returning how many receivers it was queued for.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the notification could not be handed off.
    fn publish(&self, notification: &N) -> Result<usize, NotifyError>;
}

/// Notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl<N> Notifier<N> for NoopNotifier {
    fn publish(&self, _notification: &N) -> Result<usize, NotifyError> {
        Ok(0)
    }
}
