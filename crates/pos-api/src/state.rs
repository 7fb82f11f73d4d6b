//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use pos_core::clock::Clock;
use pos_core::repository::EventRepository;
use pos_orders::application::payment::PaymentProvider;
use pos_orders::application::producer::OrderNotifier;
use pos_realtime::{ConnectionRegistry, SocketGateway};

/// Application state shared across all request handlers.
///
/// Owns the live connection registry; dropping the last clone drops every
/// connection's outbound queue.
#[derive(Clone)]
pub struct AppState {
    /// Source of timestamps and of "today".
    pub clock: Arc<dyn Clock>,
    /// Event store.
    pub event_repository: Arc<dyn EventRepository>,
    /// Where committed order writes are announced.
    pub notifier: Arc<OrderNotifier>,
    /// Online payment provider.
    pub payment_provider: Arc<dyn PaymentProvider>,
    /// Live real-time connections.
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        event_repository: Arc<dyn EventRepository>,
        notifier: Arc<OrderNotifier>,
        payment_provider: Arc<dyn PaymentProvider>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            clock,
            event_repository,
            notifier,
            payment_provider,
            registry,
        }
    }

    /// State whose notifier is `gateway`, fanning out to the gateway's
    /// registry.
    #[must_use]
    pub fn with_gateway(
        clock: Arc<dyn Clock>,
        event_repository: Arc<dyn EventRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        gateway: Arc<SocketGateway>,
    ) -> Self {
        let registry = Arc::clone(gateway.registry());
        Self::new(clock, event_repository, gateway, payment_provider, registry)
    }
}

impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.registry)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
