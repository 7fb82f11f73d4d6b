//! The socket gateway: order notifications in, text frames out.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::ws::Message;
use pos_core::notify::{Notifier, NotifyError};
use pos_orders::domain::notifications::OrderNotification;
use tracing::{debug, warn};

use crate::audience::{Audience, Everyone};
use crate::registry::{ConnectionRegistry, Delivery};

/// Relays order notifications to connected clients.
///
/// Emits are serialized so that every connection sees notifications in the
/// order they were emitted.
pub struct SocketGateway {
    registry: Arc<ConnectionRegistry>,
    audience: Box<dyn Audience>,
    emit_lock: Mutex<()>,
}

impl std::fmt::Debug for SocketGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketGateway")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl SocketGateway {
    /// Creates a gateway that broadcasts to every connection.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_audience(registry, Everyone)
    }

    /// Creates a gateway that only sends to connections `audience` selects.
    pub fn with_audience(
        registry: Arc<ConnectionRegistry>,
        audience: impl Audience + 'static,
    ) -> Self {
        Self {
            registry,
            audience: Box::new(audience),
            emit_lock: Mutex::new(()),
        }
    }

    /// The live connection set this gateway fans out to.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Sends `notification` to every selected connection and returns how
    /// many it was queued on. Zero connections is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Encoding` if the notification cannot be
    /// serialized.
    pub fn emit(&self, notification: &OrderNotification) -> Result<usize, NotifyError> {
        let text = serde_json::to_string(notification)
            .map_err(|e| NotifyError::Encoding(e.to_string()))?;
        let frame = Message::Text(text.into());
        let event = notification.event_name();

        let _ordered = self.emit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let queued = self.registry.fan_out(
            &frame,
            |client| self.audience.includes(client, notification),
            |connection_id, delivery| match delivery {
                Delivery::Queued => {}
                Delivery::Full => {
                    warn!(%connection_id, event, "client buffer full, notification dropped");
                }
                Delivery::Closed => {
                    debug!(%connection_id, event, "client already closed, notification dropped");
                }
            },
        );
        Ok(queued)
    }
}

impl Notifier<OrderNotification> for SocketGateway {
    fn publish(&self, notification: &OrderNotification) -> Result<usize, NotifyError> {
        self.emit(notification)
    }
}

#[cfg(test)]
mod tests {
    use pos_orders::domain::model::{OrderId, OrderStatus};
    use pos_orders::domain::notifications::OrderStatusChange;

    use super::*;
    use crate::audience::RoleAudience;
    use crate::registry::ClientInfo;

    fn status_changed(order: &str, status: OrderStatus) -> OrderNotification {
        OrderNotification::StatusChanged(OrderStatusChange {
            order_id: OrderId::new(order),
            status,
        })
    }

    fn frame_json(message: Message) -> serde_json::Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_emit_with_no_clients_is_a_no_op() {
        let gateway = SocketGateway::new(Arc::new(ConnectionRegistry::new()));

        let queued = gateway.emit(&status_changed("ord_1", OrderStatus::Ready));

        assert_eq!(queued.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_emit_preserves_order_per_connection() {
        // Arrange
        let registry = Arc::new(ConnectionRegistry::new());
        let mut first = registry.connect(ClientInfo::default());
        let mut second = registry.connect(ClientInfo::default());
        let gateway = SocketGateway::new(Arc::clone(&registry));
        let sequence = [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ];

        // Act
        for status in sequence {
            assert_eq!(gateway.emit(&status_changed("ord_7", status)).unwrap(), 2);
        }

        // Assert
        for connection in [&mut first, &mut second] {
            for status in sequence {
                let json = frame_json(connection.frames.recv().await.unwrap());
                assert_eq!(json["event"], "order:statusChanged");
                assert_eq!(json["data"]["orderId"], "ord_7");
                assert_eq!(json["data"]["status"], serde_json::to_value(status).unwrap());
            }
        }
    }

    #[tokio::test]
    async fn test_closed_connection_does_not_affect_others() {
        let registry = Arc::new(ConnectionRegistry::new());
        let closed = registry.connect(ClientInfo::default());
        let mut open = registry.connect(ClientInfo::default());
        drop(closed.frames);
        let gateway = SocketGateway::new(Arc::clone(&registry));

        let queued = gateway
            .emit(&status_changed("ord_2", OrderStatus::Preparing))
            .unwrap();

        assert_eq!(queued, 1);
        let json = frame_json(open.frames.recv().await.unwrap());
        assert_eq!(json["data"]["status"], "PREPARING");
    }

    #[tokio::test]
    async fn test_audience_limits_recipients() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut kitchen = registry.connect(ClientInfo {
            role: Some("kitchen".into()),
            station: None,
        });
        let mut cashier = registry.connect(ClientInfo {
            role: Some("cashier".into()),
            station: None,
        });
        let gateway =
            SocketGateway::with_audience(Arc::clone(&registry), RoleAudience::new(["kitchen"]));

        let queued = gateway
            .publish(&status_changed("ord_3", OrderStatus::Ready))
            .unwrap();

        assert_eq!(queued, 1);
        assert!(kitchen.frames.recv().await.is_some());
        assert!(cashier.frames.try_recv().is_err());
    }
}
