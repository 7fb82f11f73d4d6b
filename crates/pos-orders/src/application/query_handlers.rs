//! Query handlers for the order context.
//!
//! Orders are rebuilt from their event streams on every read. The read
//! side is small enough that no projection table is kept.

use std::collections::BTreeMap;

use pos_core::error::DomainError;
use pos_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

use crate::application::command_handlers::reconstitute;
use crate::domain::model::{OrderSnapshot, OrderStatus};

/// Retrieves an order by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// and `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_order_by_id(
    order_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<OrderSnapshot, DomainError> {
    let stored_events = repo.load_events(order_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::AggregateNotFound(order_id));
    }
    reconstitute(order_id, &stored_events)?.snapshot()
}

/// Rebuilds every order in the store, in no particular order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn load_all_orders(
    repo: &dyn EventRepository,
) -> Result<Vec<OrderSnapshot>, DomainError> {
    let mut streams: BTreeMap<Uuid, Vec<StoredEvent>> = BTreeMap::new();
    for event in repo.load_all_events().await? {
        streams.entry(event.aggregate_id).or_default().push(event);
    }

    streams
        .into_iter()
        .map(|(order_id, mut events)| {
            events.sort_by_key(|e| e.sequence_number);
            reconstitute(order_id, &events)?.snapshot()
        })
        .collect()
}

/// Lists orders, newest first, optionally only those in `status`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_orders(
    status: Option<OrderStatus>,
    repo: &dyn EventRepository,
) -> Result<Vec<OrderSnapshot>, DomainError> {
    let mut orders: Vec<OrderSnapshot> = load_all_orders(repo)
        .await?
        .into_iter()
        .filter(|order| status.is_none_or(|s| order.status == s))
        .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
}
