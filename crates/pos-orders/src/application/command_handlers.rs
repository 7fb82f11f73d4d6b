//! Command handlers for the order context.
//!
//! Each handler loads the aggregate, executes the command, persists the
//! resulting events and only then announces the change. A failure anywhere
//! before the append returns early, so no notification leaves for a write
//! that did not happen.

use pos_core::aggregate::AggregateRoot;
use pos_core::clock::Clock;
use pos_core::command::Command;
use pos_core::error::DomainError;
use pos_core::event::EventMetadata;
use pos_core::repository::{EventRepository, StoredEvent};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::payment::{PaymentProvider, PaymentSession};
use crate::application::producer::{OrderNotifier, announce};
use crate::domain::aggregates::Order;
use crate::domain::commands::{ChangeOrderStatus, CreateOrder, CreatePayment, UpdateOrder};
use crate::domain::events::{OrderEvent, OrderEventKind};
use crate::domain::model::{OrderId, OrderSnapshot};
use crate::domain::notifications::{OrderNotification, OrderStatusChange};

/// Result of a successfully handled order command.
#[derive(Debug)]
pub struct OrderCommandResult {
    /// The order affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
    /// The order after the write.
    pub order: OrderSnapshot,
}

/// Result of a successfully started online payment.
#[derive(Debug)]
pub struct PaymentCommandResult {
    /// The order being paid, after the write.
    pub order: OrderSnapshot,
    /// Where to send the customer, and the provider transaction.
    pub session: PaymentSession,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes an `Order` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    order_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Order, DomainError> {
    let mut order = Order::new(order_id);
    for stored in existing_events {
        let kind: OrderEventKind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })?;
        let event = OrderEvent {
            metadata: EventMetadata::from(stored),
            kind,
        };
        order.apply(&event);
    }
    Ok(order)
}

async fn load(order_id: Uuid, repo: &dyn EventRepository) -> Result<Order, DomainError> {
    let existing_events = repo.load_events(order_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(order_id));
    }
    reconstitute(order_id, &existing_events)
}

/// Appends the recorded events and folds them into the aggregate.
async fn commit(
    order: &mut Order,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = order
        .uncommitted_events()
        .iter()
        .map(StoredEvent::from_domain_event)
        .collect();

    repo.append_events(order.id, order.version(), &stored_events)
        .await?;
    order.mark_committed();

    Ok(stored_events)
}

/// Handles the `CreateOrder` command: places a new order, persists it and
/// announces `order:created`.
///
/// # Errors
///
/// Returns `DomainError` if validation or event appending fails.
#[instrument(skip_all, fields(command = command.command_type(), correlation_id = %command.correlation_id))]
pub async fn handle_create_order(
    command: &CreateOrder,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    notifier: &OrderNotifier,
) -> Result<OrderCommandResult, DomainError> {
    let order_id = Uuid::new_v4();
    let mut order = Order::new(order_id);

    order.place(command, clock)?;
    let stored_events = commit(&mut order, repo).await?;
    let snapshot = order.snapshot()?;

    info!(%order_id, total = snapshot.total, "order placed");
    announce(notifier, &OrderNotification::Created(snapshot.clone()));

    Ok(OrderCommandResult {
        aggregate_id: order_id,
        stored_events,
        order: snapshot,
    })
}

/// Handles the `UpdateOrder` command: revises an open order, persists the
/// change and announces `order:updated`.
///
/// # Errors
///
/// Returns `DomainError` if the order is missing, the change is invalid or
/// event loading/appending fails.
#[instrument(skip_all, fields(command = command.command_type(), order_id = %command.order_id))]
pub async fn handle_update_order(
    command: &UpdateOrder,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    notifier: &OrderNotifier,
) -> Result<OrderCommandResult, DomainError> {
    let mut order = load(command.order_id, repo).await?;

    order.revise(command, clock)?;
    let stored_events = commit(&mut order, repo).await?;
    let snapshot = order.snapshot()?;

    info!(version = snapshot.version, "order revised");
    announce(notifier, &OrderNotification::Updated(snapshot.clone()));

    Ok(OrderCommandResult {
        aggregate_id: command.order_id,
        stored_events,
        order: snapshot,
    })
}

/// Handles the `ChangeOrderStatus` command: moves the order along its
/// lifecycle, persists the change and announces `order:statusChanged`.
///
/// # Errors
///
/// Returns `DomainError` if the order is missing, the transition is not
/// allowed or event loading/appending fails.
#[instrument(skip_all, fields(command = command.command_type(), order_id = %command.order_id))]
pub async fn handle_change_order_status(
    command: &ChangeOrderStatus,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    notifier: &OrderNotifier,
) -> Result<OrderCommandResult, DomainError> {
    let mut order = load(command.order_id, repo).await?;

    order.change_status(command, clock)?;
    let stored_events = commit(&mut order, repo).await?;
    let snapshot = order.snapshot()?;

    info!(status = ?snapshot.status, "order status changed");
    announce(
        notifier,
        &OrderNotification::StatusChanged(OrderStatusChange {
            order_id: OrderId::from(command.order_id),
            status: snapshot.status,
        }),
    );

    Ok(OrderCommandResult {
        aggregate_id: command.order_id,
        stored_events,
        order: snapshot,
    })
}

/// Handles the `CreatePayment` command: asks the provider for a checkout
/// session, records the attempt on the order and announces `order:updated`.
///
/// # Errors
///
/// Returns `DomainError` if the order is missing or not payable, the
/// provider fails, or event loading/appending fails.
#[instrument(skip_all, fields(command = command.command_type(), order_id = %command.order_id))]
pub async fn handle_create_payment(
    command: &CreatePayment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    provider: &dyn PaymentProvider,
    notifier: &OrderNotifier,
) -> Result<PaymentCommandResult, DomainError> {
    let mut order = load(command.order_id, repo).await?;
    order.ensure_payable(command.payment_method)?;

    let session = provider
        .create_payment(&order.snapshot()?, command.payment_method)
        .await?;

    order.request_payment(
        command.payment_method,
        session.transaction_id.clone(),
        command.causation_id(),
        clock,
    )?;
    let stored_events = commit(&mut order, repo).await?;
    let snapshot = order.snapshot()?;

    info!(
        provider = command.payment_method.as_str(),
        transaction_id = %session.transaction_id,
        "online payment started"
    );
    announce(notifier, &OrderNotification::Updated(snapshot.clone()));

    Ok(PaymentCommandResult {
        order: snapshot,
        session,
        stored_events,
    })
}
