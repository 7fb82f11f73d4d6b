//! Domain events for the order context.

use pos_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{OrderItem, OrderStatus, PaymentMethod, PaymentStatus};

/// Emitted when an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    /// The order identifier.
    pub order_id: Uuid,
    /// The user who placed the order.
    pub created_by: Uuid,
    /// Ordered lines.
    pub items: Vec<OrderItem>,
    /// Chosen payment method.
    pub payment_method: PaymentMethod,
    /// Table, counter or kitchen line.
    pub station: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Emitted when an open order is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRevised {
    /// The order identifier.
    pub order_id: Uuid,
    /// Replacement item list, if changed.
    pub items: Option<Vec<OrderItem>>,
    /// Replacement note, if changed.
    pub note: Option<String>,
    /// Replacement payment method, if changed.
    pub payment_method: Option<PaymentMethod>,
    /// Replacement payment status, if changed.
    pub payment_status: Option<PaymentStatus>,
    /// Replacement station, if changed.
    pub station: Option<String>,
}

/// Emitted when an order moves along its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    /// The order identifier.
    pub order_id: Uuid,
    /// Status before the change.
    pub from: OrderStatus,
    /// Status after the change.
    pub to: OrderStatus,
}

/// Emitted when an online payment is started for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequested {
    /// The order identifier.
    pub order_id: Uuid,
    /// Online provider handling the payment.
    pub payment_method: PaymentMethod,
    /// Provider-side transaction reference.
    pub transaction_id: String,
}

/// Event type identifier for [`OrderPlaced`].
pub const ORDER_PLACED_EVENT_TYPE: &str = "order.placed";

/// Event type identifier for [`OrderRevised`].
pub const ORDER_REVISED_EVENT_TYPE: &str = "order.revised";

/// Event type identifier for [`OrderStatusChanged`].
pub const ORDER_STATUS_CHANGED_EVENT_TYPE: &str = "order.status_changed";

/// Event type identifier for [`PaymentRequested`].
pub const PAYMENT_REQUESTED_EVENT_TYPE: &str = "order.payment_requested";

/// Event payload variants for the order context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEventKind {
    /// An order has been placed.
    OrderPlaced(OrderPlaced),
    /// An order has been revised.
    OrderRevised(OrderRevised),
    /// An order changed status.
    OrderStatusChanged(OrderStatusChanged),
    /// An online payment has been started.
    PaymentRequested(PaymentRequested),
}

impl OrderEventKind {
    /// Event type identifier of this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrderPlaced(_) => ORDER_PLACED_EVENT_TYPE,
            Self::OrderRevised(_) => ORDER_REVISED_EVENT_TYPE,
            Self::OrderStatusChanged(_) => ORDER_STATUS_CHANGED_EVENT_TYPE,
            Self::PaymentRequested(_) => PAYMENT_REQUESTED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the order context.
#[derive(Debug, Clone)]
pub struct OrderEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: OrderEventKind,
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("OrderEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
