//! Aggregate roots for the order context.

use chrono::{DateTime, Utc};
use pos_core::aggregate::AggregateRoot;
use pos_core::clock::Clock;
use pos_core::error::DomainError;
use pos_core::event::EventMetadata;
use uuid::Uuid;

use super::commands::{ChangeOrderStatus, CreateOrder, UpdateOrder};
use super::events::{
    OrderEvent, OrderEventKind, OrderPlaced, OrderRevised, OrderStatusChanged, PaymentRequested,
};
use super::model::{
    OrderId, OrderItem, OrderSnapshot, OrderStatus, PaymentMethod, PaymentStatus, order_total,
    validate_items,
};

/// The aggregate root for a single order.
#[derive(Debug)]
pub struct Order {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    created_by: Option<Uuid>,
    items: Vec<OrderItem>,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    station: Option<String>,
    note: Option<String>,
    transaction_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<OrderEvent>,
}

impl Order {
    /// Creates an empty, not yet placed order.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            created_by: None,
            items: Vec::new(),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Unpaid,
            station: None,
            note: None,
            transaction_id: None,
            created_at: None,
            updated_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Current settlement status.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    fn is_placed(&self) -> bool {
        self.created_by.is_some()
    }

    fn ensure_placed(&self) -> Result<(), DomainError> {
        if self.is_placed() {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    fn record(
        &mut self,
        kind: OrderEventKind,
        correlation_id: Uuid,
        causation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let metadata = EventMetadata::record(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            causation_id,
            clock.now(),
        );
        self.uncommitted_events.push(OrderEvent { metadata, kind });
    }

    /// Places the order, producing an `OrderPlaced` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the order was already placed or
    /// the item list is invalid.
    pub fn place(&mut self, command: &CreateOrder, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.is_placed() || !self.uncommitted_events.is_empty() {
            return Err(DomainError::Validation(format!(
                "order {} has already been placed",
                self.id
            )));
        }
        validate_items(&command.items)?;

        let kind = OrderEventKind::OrderPlaced(OrderPlaced {
            order_id: self.id,
            created_by: command.created_by,
            items: command.items.clone(),
            payment_method: command.payment_method,
            station: command.station.clone(),
            note: command.note.clone(),
        });
        self.record(kind, command.correlation_id, command.correlation_id, clock);
        Ok(())
    }

    /// Edits an open order, producing an `OrderRevised` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the order was never placed,
    /// and `DomainError::Validation` if nothing would change, the order is
    /// closed or the new items are invalid.
    pub fn revise(&mut self, command: &UpdateOrder, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_placed()?;
        let changes = &command.changes;
        if changes.is_empty() {
            return Err(DomainError::Validation(format!(
                "update for order {} changes nothing",
                self.id
            )));
        }
        if self.status.is_terminal() {
            return Err(DomainError::Validation(format!(
                "order {} is {:?} and can no longer be edited",
                self.id, self.status
            )));
        }
        if let Some(items) = &changes.items {
            validate_items(items)?;
        }

        let kind = OrderEventKind::OrderRevised(OrderRevised {
            order_id: self.id,
            items: changes.items.clone(),
            note: changes.note.clone(),
            payment_method: changes.payment_method,
            payment_status: changes.payment_status,
            station: changes.station.clone(),
        });
        self.record(kind, command.correlation_id, command.correlation_id, clock);
        Ok(())
    }

    /// Moves the order along its lifecycle, producing an
    /// `OrderStatusChanged` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the order was never placed,
    /// and `DomainError::Validation` if the transition is not allowed.
    pub fn change_status(
        &mut self,
        command: &ChangeOrderStatus,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_placed()?;
        if self.status == command.status {
            return Err(DomainError::Validation(format!(
                "order {} is already {:?}",
                self.id, self.status
            )));
        }
        if !self.status.can_transition_to(command.status) {
            return Err(DomainError::Validation(format!(
                "order {} cannot move from {:?} to {:?}",
                self.id, self.status, command.status
            )));
        }

        let kind = OrderEventKind::OrderStatusChanged(OrderStatusChanged {
            order_id: self.id,
            from: self.status,
            to: command.status,
        });
        self.record(kind, command.correlation_id, command.correlation_id, clock);
        Ok(())
    }

    /// Checks that an online payment with `method` may be started.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the order was never placed,
    /// and `DomainError::Validation` if the order is cancelled, already paid
    /// or `method` is not an online provider.
    pub fn ensure_payable(&self, method: PaymentMethod) -> Result<(), DomainError> {
        self.ensure_placed()?;
        if !method.is_online() {
            return Err(DomainError::Validation(format!(
                "{} is not an online payment method",
                method.as_str()
            )));
        }
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::Validation(format!(
                "order {} is cancelled",
                self.id
            )));
        }
        if self.payment_status == PaymentStatus::Paid {
            return Err(DomainError::Validation(format!(
                "order {} is already paid",
                self.id
            )));
        }
        Ok(())
    }

    /// Records that an online payment was started, producing a
    /// `PaymentRequested` event.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Order::ensure_payable`].
    pub fn request_payment(
        &mut self,
        method: PaymentMethod,
        transaction_id: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_payable(method)?;
        let kind = OrderEventKind::PaymentRequested(PaymentRequested {
            order_id: self.id,
            payment_method: method,
            transaction_id,
        });
        self.record(kind, correlation_id, correlation_id, clock);
        Ok(())
    }

    /// Read view of the committed state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the order was never placed.
    pub fn snapshot(&self) -> Result<OrderSnapshot, DomainError> {
        let (Some(created_by), Some(created_at)) = (self.created_by, self.created_at) else {
            return Err(DomainError::AggregateNotFound(self.id));
        };
        Ok(OrderSnapshot {
            id: OrderId::from(self.id),
            items: self.items.clone(),
            total: order_total(&self.items),
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            created_by,
            station: self.station.clone(),
            note: self.note.clone(),
            transaction_id: self.transaction_id.clone(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            version: self.version,
        })
    }
}

impl AggregateRoot for Order {
    type Event = OrderEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            OrderEventKind::OrderPlaced(placed) => {
                self.created_by = Some(placed.created_by);
                self.items.clone_from(&placed.items);
                self.payment_method = placed.payment_method;
                self.payment_status = PaymentStatus::Unpaid;
                self.status = OrderStatus::Pending;
                self.station.clone_from(&placed.station);
                self.note.clone_from(&placed.note);
                self.created_at = Some(event.metadata.occurred_at);
            }
            OrderEventKind::OrderRevised(revised) => {
                if let Some(items) = &revised.items {
                    self.items.clone_from(items);
                }
                if let Some(note) = &revised.note {
                    self.note = Some(note.clone());
                }
                if let Some(method) = revised.payment_method {
                    self.payment_method = method;
                }
                if let Some(status) = revised.payment_status {
                    self.payment_status = status;
                }
                if let Some(station) = &revised.station {
                    self.station = Some(station.clone());
                }
            }
            OrderEventKind::OrderStatusChanged(changed) => {
                self.status = changed.to;
            }
            OrderEventKind::PaymentRequested(requested) => {
                self.payment_method = requested.payment_method;
                self.payment_status = PaymentStatus::Pending;
                self.transaction_id = Some(requested.transaction_id.clone());
            }
        }
        self.updated_at = Some(event.metadata.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
