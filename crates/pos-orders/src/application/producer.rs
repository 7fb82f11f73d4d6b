//! Order event producer.
//!
//! Command handlers call [`announce`] exactly once per committed write. The
//! notifier's outcome never flows back into the write path.

use pos_core::notify::Notifier;
use tracing::{debug, warn};

use crate::domain::notifications::OrderNotification;

/// Notifier specialised to order notifications.
pub type OrderNotifier = dyn Notifier<OrderNotification>;

/// Hands `notification` to `notifier`, logging rather than propagating a
/// failure.
pub fn announce(notifier: &OrderNotifier, notification: &OrderNotification) {
    match notifier.publish(notification) {
        Ok(receivers) => debug!(
            event = notification.event_name(),
            order_id = %notification.order_id(),
            receivers,
            "order notification published"
        ),
        Err(err) => warn!(
            event = notification.event_name(),
            order_id = %notification.order_id(),
            error = %err,
            "order notification dropped"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos_test_support::{FailingNotifier, RecordingNotifier};

    use crate::domain::model::{OrderId, OrderStatus};
    use crate::domain::notifications::OrderStatusChange;

    fn status_changed() -> OrderNotification {
        OrderNotification::StatusChanged(OrderStatusChange {
            order_id: OrderId::new("ord_1"),
            status: OrderStatus::Ready,
        })
    }

    #[test]
    fn test_announce_hands_notification_to_notifier() {
        let notifier = RecordingNotifier::<OrderNotification>::new();

        announce(&notifier, &status_changed());

        assert_eq!(notifier.published(), vec![status_changed()]);
    }

    #[test]
    fn test_announce_swallows_notifier_failure() {
        let notifier = FailingNotifier;

        announce(&notifier, &status_changed());
    }
}
