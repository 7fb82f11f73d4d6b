//! Live set of WebSocket connections.
//!
//! The registry holds only the outbound half of each connection plus the
//! identity the client declared at connect time. Dropping an entry drops the
//! only sender, which ends that connection's forwarding task.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Frames buffered per connection before new ones are dropped.
pub const OUTBOUND_BUFFER_SIZE: usize = 256;

/// What a client declared about itself when connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Staff role, e.g. `cashier` or `kitchen`.
    pub role: Option<String>,
    /// Table, counter or kitchen line the client serves.
    pub station: Option<String>,
}

/// A freshly registered connection.
#[derive(Debug)]
pub struct Connection {
    /// Registry key of the connection.
    pub id: ConnectionId,
    /// Frames queued for the client, in FIFO order.
    pub frames: mpsc::Receiver<Message>,
}

#[derive(Debug)]
struct Entry {
    info: ClientInfo,
    outbound: mpsc::Sender<Message>,
}

/// Outcome of queuing one frame on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Queued,
    Full,
    Closed,
}

impl From<Result<(), TrySendError<Message>>> for Delivery {
    fn from(result: Result<(), TrySendError<Message>>) -> Self {
        match result {
            Ok(()) => Self::Queued,
            Err(TrySendError::Full(_)) => Self::Full,
            Err(TrySendError::Closed(_)) => Self::Closed,
        }
    }
}

/// Concurrent registry of connected clients.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Entry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client and returns the receiving end of its outbound
    /// queue.
    pub fn connect(&self, info: ClientInfo) -> Connection {
        let (outbound, frames) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let id = Uuid::new_v4();
        info!(
            connection_id = %id,
            role = info.role.as_deref(),
            station = info.station.as_deref(),
            "client connected"
        );
        self.connections.insert(id, Entry { info, outbound });
        Connection { id, frames }
    }

    /// Removes a client. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.remove(id).is_some();
        if removed {
            info!(connection_id = %id, "client disconnected");
        }
        removed
    }

    /// Queues `message` for a single client. Returns `false` if the client
    /// is gone or its buffer is full.
    pub fn send(&self, id: &ConnectionId, message: Message) -> bool {
        self.connections
            .get(id)
            .is_some_and(|entry| entry.outbound.try_send(message).is_ok())
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Drops every connection, returning how many there were. Their
    /// forwarding tasks observe the closed queue and close the sockets.
    pub fn close_all(&self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        if count > 0 {
            info!(connections = count, "closed all client connections");
        }
        count
    }

    /// Offers `message` to every connection `accept` selects and reports each
    /// outcome to `report`. Returns how many connections it was queued on.
    pub(crate) fn fan_out(
        &self,
        message: &Message,
        mut accept: impl FnMut(&ClientInfo) -> bool,
        mut report: impl FnMut(ConnectionId, Delivery),
    ) -> usize {
        let mut queued = 0;
        for entry in &self.connections {
            if !accept(&entry.info) {
                continue;
            }
            let delivery = Delivery::from(entry.outbound.try_send(message.clone()));
            if delivery == Delivery::Queued {
                queued += 1;
            }
            report(*entry.key(), delivery);
        }
        debug!(queued, "frame fanned out");
        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(message: &Message) -> &str {
        match message {
            Message::Text(text) => text.as_str(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_and_disconnect_maintain_live_set() {
        let registry = ConnectionRegistry::new();

        let a = registry.connect(ClientInfo::default());
        let b = registry.connect(ClientInfo::default());

        assert_eq!(registry.connection_count(), 2);
        assert!(registry.disconnect(&a.id));
        assert_eq!(registry.connection_count(), 1);
        assert!(registry.send(&b.id, Message::Text("still here".into())));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let connection = registry.connect(ClientInfo::default());

        assert!(registry.disconnect(&connection.id));
        assert!(!registry.disconnect(&connection.id));
        assert!(!registry.disconnect(&Uuid::new_v4()));
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_fan_out_skips_rejected_and_closed_connections() {
        // Arrange
        let registry = ConnectionRegistry::new();
        let mut kitchen = registry.connect(ClientInfo {
            role: Some("kitchen".into()),
            station: None,
        });
        let _cashier = registry.connect(ClientInfo {
            role: Some("cashier".into()),
            station: None,
        });
        let gone = registry.connect(ClientInfo {
            role: Some("kitchen".into()),
            station: None,
        });
        drop(gone.frames);
        let mut outcomes = Vec::new();

        // Act
        let queued = registry.fan_out(
            &Message::Text("hello".into()),
            |info| info.role.as_deref() == Some("kitchen"),
            |id, delivery| outcomes.push((id, delivery)),
        );

        // Assert
        assert_eq!(queued, 1);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&(gone.id, Delivery::Closed)));
        assert!(outcomes.contains(&(kitchen.id, Delivery::Queued)));
        assert_eq!(text(&kitchen.frames.recv().await.unwrap()), "hello");
    }

    #[test]
    fn test_full_buffer_drops_new_frames() {
        let registry = ConnectionRegistry::new();
        let _slow = registry.connect(ClientInfo::default());
        for _ in 0..OUTBOUND_BUFFER_SIZE {
            registry.fan_out(&Message::Text("x".into()), |_| true, |_, _| {});
        }

        let mut last = None;
        let queued = registry.fan_out(
            &Message::Text("overflow".into()),
            |_| true,
            |_, delivery| last = Some(delivery),
        );

        assert_eq!(queued, 0);
        assert_eq!(last, Some(Delivery::Full));
    }

    #[tokio::test]
    async fn test_close_all_ends_every_queue() {
        let registry = ConnectionRegistry::new();
        let mut connection = registry.connect(ClientInfo::default());

        assert_eq!(registry.close_all(), 1);

        assert_eq!(registry.connection_count(), 0);
        assert!(connection.frames.recv().await.is_none());
    }
}
