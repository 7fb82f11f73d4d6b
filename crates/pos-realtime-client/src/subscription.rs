//! Transport-independent subscription bookkeeping and dispatch.
//!
//! [`OrderSubscriptions`] is what the connection task feeds decoded frames
//! into. It can be driven directly, which is how the dispatch rules are
//! tested without a socket.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use pos_orders::domain::model::OrderSnapshot;
use pos_orders::domain::notifications::{OrderNotification, OrderStatusChange};
use tokio::sync::watch;
use tracing::debug;

/// Shared callback for one notification kind.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Lifecycle of the client's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none being attempted right now.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Frames are flowing.
    Connected,
}

/// Callbacks of one subscription. Every callback is optional.
#[derive(Clone, Default)]
pub struct OrderCallbacks {
    /// Runs with the full order on `order:created`.
    pub on_order_created: Option<Callback<OrderSnapshot>>,
    /// Runs with the full order on `order:updated`.
    pub on_order_updated: Option<Callback<OrderSnapshot>>,
    /// Runs with `{orderId, status}` on `order:statusChanged`.
    pub on_order_status_changed: Option<Callback<OrderStatusChange>>,
}

impl OrderCallbacks {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `order:created` callback.
    #[must_use]
    pub fn on_created(mut self, f: impl Fn(&OrderSnapshot) + Send + Sync + 'static) -> Self {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    /// Sets the `order:updated` callback.
    #[must_use]
    pub fn on_updated(mut self, f: impl Fn(&OrderSnapshot) + Send + Sync + 'static) -> Self {
        self.on_order_updated = Some(Arc::new(f));
        self
    }

    /// Sets the `order:statusChanged` callback.
    #[must_use]
    pub fn on_status_changed(
        mut self,
        f: impl Fn(&OrderStatusChange) + Send + Sync + 'static,
    ) -> Self {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    /// Whether no callback is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_order_created.is_none()
            && self.on_order_updated.is_none()
            && self.on_order_status_changed.is_none()
    }
}

impl fmt::Debug for OrderCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderCallbacks")
            .field("on_order_created", &self.on_order_created.is_some())
            .field("on_order_updated", &self.on_order_updated.is_some())
            .field("on_order_status_changed", &self.on_order_status_changed.is_some())
            .finish()
    }
}

/// A callback picked for one notification, ready to run unlocked.
enum Pending {
    Order(Callback<OrderSnapshot>),
    Status(Callback<OrderStatusChange>),
}

#[derive(Debug, Default)]
struct Entries {
    next_id: u64,
    by_id: BTreeMap<u64, OrderCallbacks>,
}

/// Every live subscription of one connection, plus the connection state.
#[derive(Debug)]
pub struct OrderSubscriptions {
    entries: Mutex<Entries>,
    state: watch::Sender<ConnectionState>,
}

impl Default for OrderSubscriptions {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            state: watch::Sender::new(ConnectionState::Disconnected),
        }
    }
}

impl OrderSubscriptions {
    /// Creates an empty set in the `Disconnected` state.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `callbacks` and returns the handle that removes them.
    pub fn subscribe(self: &Arc<Self>, callbacks: OrderCallbacks) -> SubscriptionHandle {
        let mut entries = self.entries();
        let id = entries.next_id;
        entries.next_id += 1;
        entries.by_id.insert(id, callbacks);
        debug!(subscription = id, "subscribed");
        SubscriptionHandle {
            id,
            subscriptions: Arc::downgrade(self),
        }
    }

    fn replace(&self, id: u64, callbacks: OrderCallbacks) {
        if let Some(slot) = self.entries().by_id.get_mut(&id) {
            *slot = callbacks;
        }
    }

    fn remove(&self, id: u64) {
        if self.entries().by_id.remove(&id).is_some() {
            debug!(subscription = id, "unsubscribed");
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().by_id.len()
    }

    /// Whether there are no live subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Records a connection state change.
    pub fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, current = ?state, "connection state changed");
        }
    }

    /// Watches connection state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Runs the matching callback of every subscription and returns how many
    /// ran. Nothing runs unless the connection is `Connected`.
    ///
    /// Callbacks run after the subscription lock is released, so they may
    /// subscribe or unsubscribe themselves.
    pub fn dispatch(&self, notification: &OrderNotification) -> usize {
        if self.state() != ConnectionState::Connected {
            return 0;
        }

        let pending: Vec<Pending> = {
            let entries = self.entries();
            entries
                .by_id
                .values()
                .filter_map(|callbacks| match notification {
                    OrderNotification::Created(_) => {
                        callbacks.on_order_created.clone().map(Pending::Order)
                    }
                    OrderNotification::Updated(_) => {
                        callbacks.on_order_updated.clone().map(Pending::Order)
                    }
                    OrderNotification::StatusChanged(_) => callbacks
                        .on_order_status_changed
                        .clone()
                        .map(Pending::Status),
                })
                .collect()
        };

        for callback in &pending {
            match (callback, notification) {
                (
                    Pending::Order(f),
                    OrderNotification::Created(order) | OrderNotification::Updated(order),
                ) => f(order),
                (Pending::Status(f), OrderNotification::StatusChanged(change)) => f(change),
                _ => {}
            }
        }
        pending.len()
    }

    /// Decodes a text frame and dispatches it if it is an order
    /// notification. Control frames such as `pong` are ignored.
    pub fn dispatch_frame(&self, text: &str) -> usize {
        match serde_json::from_str::<OrderNotification>(text) {
            Ok(notification) => self.dispatch(&notification),
            Err(e) => {
                debug!(error = %e, "ignoring non-order frame");
                0
            }
        }
    }
}

/// Owner of one subscription. Dropping it removes the subscription's
/// callbacks and nothing else.
#[derive(Debug)]
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct SubscriptionHandle {
    id: u64,
    subscriptions: Weak<OrderSubscriptions>,
}

impl SubscriptionHandle {
    /// Swaps this subscription's callbacks in one step. The old callbacks
    /// never see a later notification.
    pub fn resubscribe(&mut self, callbacks: OrderCallbacks) {
        if let Some(subscriptions) = self.subscriptions.upgrade() {
            subscriptions.replace(self.id, callbacks);
        }
    }

    /// Removes the subscription now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(subscriptions) = self.subscriptions.upgrade() {
            subscriptions.remove(self.id);
        }
    }
}
