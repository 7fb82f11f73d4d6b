//! Real-time order notifications.
//!
//! These are what connected clients receive, as JSON text frames of the form
//! `{"event": "order:statusChanged", "data": {"orderId": "...", "status": "READY"}}`.
//! They are transient: built after a write commits, sent once and never stored.

use serde::{Deserialize, Serialize};

use super::model::{OrderId, OrderSnapshot, OrderStatus};

/// Wire name of [`OrderNotification::Created`].
pub const ORDER_CREATED_EVENT: &str = "order:created";

/// Wire name of [`OrderNotification::Updated`].
pub const ORDER_UPDATED_EVENT: &str = "order:updated";

/// Wire name of [`OrderNotification::StatusChanged`].
pub const ORDER_STATUS_CHANGED_EVENT: &str = "order:statusChanged";

/// Discriminator of an [`OrderNotification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// An order was placed.
    Created,
    /// An order's contents or payment changed.
    Updated,
    /// An order moved along its lifecycle.
    StatusChanged,
}

/// Minimal payload of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChange {
    /// The order that moved.
    pub order_id: OrderId,
    /// Its new status.
    pub status: OrderStatus,
}

/// A notification about a committed order write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OrderNotification {
    /// Carries the full order.
    #[serde(rename = "order:created")]
    Created(OrderSnapshot),
    /// Carries the full order.
    #[serde(rename = "order:updated")]
    Updated(OrderSnapshot),
    /// Carries only the id and the new status.
    #[serde(rename = "order:statusChanged")]
    StatusChanged(OrderStatusChange),
}

impl OrderNotification {
    /// The discriminator of this notification.
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Created(_) => NotificationKind::Created,
            Self::Updated(_) => NotificationKind::Updated,
            Self::StatusChanged(_) => NotificationKind::StatusChanged,
        }
    }

    /// Wire event name.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self.kind() {
            NotificationKind::Created => ORDER_CREATED_EVENT,
            NotificationKind::Updated => ORDER_UPDATED_EVENT,
            NotificationKind::StatusChanged => ORDER_STATUS_CHANGED_EVENT,
        }
    }

    /// The order this notification is about.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Created(order) | Self::Updated(order) => &order.id,
            Self::StatusChanged(change) => &change.order_id,
        }
    }

    /// Station of the order, when the payload carries it.
    #[must_use]
    pub fn station(&self) -> Option<&str> {
        match self {
            Self::Created(order) | Self::Updated(order) => order.station.as_deref(),
            Self::StatusChanged(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_changed_wire_format() {
        let notification = OrderNotification::StatusChanged(OrderStatusChange {
            order_id: OrderId::new("ord_123"),
            status: OrderStatus::Preparing,
        });

        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "event": "order:statusChanged",
                "data": { "orderId": "ord_123", "status": "PREPARING" }
            })
        );
        assert_eq!(notification.event_name(), ORDER_STATUS_CHANGED_EVENT);
        assert_eq!(notification.order_id().as_str(), "ord_123");
    }

    #[test]
    fn test_created_frame_parses_back_into_full_order() {
        let frame = serde_json::json!({
            "event": "order:created",
            "data": {
                "id": "ord_9",
                "items": [
                    { "productId": "tra-da", "name": "Tra da", "quantity": 3, "unitPrice": 5000 }
                ],
                "total": 15000,
                "status": "PENDING",
                "paymentMethod": "CASH",
                "paymentStatus": "UNPAID",
                "createdBy": "6f1c2d0e-5b7a-4c1e-9a59-2d9e0f6b7a11",
                "station": "bar",
                "createdAt": "2026-01-15T10:00:00Z",
                "updatedAt": "2026-01-15T10:00:00Z",
                "version": 1
            }
        });

        let notification: OrderNotification = serde_json::from_value(frame).unwrap();

        assert_eq!(notification.kind(), NotificationKind::Created);
        assert_eq!(notification.station(), Some("bar"));
        match notification {
            OrderNotification::Created(order) => {
                assert_eq!(order.id.as_str(), "ord_9");
                assert_eq!(order.total, 15_000);
                assert!(order.note.is_none());
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }
}
