//! Commands for the order context.

use pos_core::command::Command;
use uuid::Uuid;

use super::model::{OrderChanges, OrderItem, OrderStatus, PaymentMethod};

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user placing the order.
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

impl Command for CreateOrder {
    fn command_type(&self) -> &'static str {
        "order.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to edit an open order.
#[derive(Debug, Clone)]
pub struct UpdateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to edit.
    pub order_id: Uuid,
    /// Fields to replace.
    pub changes: OrderChanges,
}

impl Command for UpdateOrder {
    fn command_type(&self) -> &'static str {
        "order.update"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move an order to another lifecycle status.
#[derive(Debug, Clone)]
pub struct ChangeOrderStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to move.
    pub order_id: Uuid,
    /// Target status.
    pub status: OrderStatus,
}

impl Command for ChangeOrderStatus {
    fn command_type(&self) -> &'static str {
        "order.change_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to start an online payment for an order.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to pay.
    pub order_id: Uuid,
    /// Online provider to use.
    pub payment_method: PaymentMethod,
}

impl Command for CreatePayment {
    fn command_type(&self) -> &'static str {
        "order.create_payment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
