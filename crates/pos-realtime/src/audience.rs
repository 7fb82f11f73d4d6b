//! Who receives a notification.

use std::collections::HashSet;

use pos_orders::domain::notifications::OrderNotification;

use crate::registry::ClientInfo;

/// Selects the connections a notification is sent to.
pub trait Audience: Send + Sync {
    /// Whether `client` should receive `notification`.
    fn includes(&self, client: &ClientInfo, notification: &OrderNotification) -> bool;
}

impl<F> Audience for F
where
    F: Fn(&ClientInfo, &OrderNotification) -> bool + Send + Sync,
{
    fn includes(&self, client: &ClientInfo, notification: &OrderNotification) -> bool {
        self(client, notification)
    }
}

/// Every connected client.
#[derive(Debug, Clone, Copy, Default)]
pub struct Everyone;

impl Audience for Everyone {
    fn includes(&self, _client: &ClientInfo, _notification: &OrderNotification) -> bool {
        true
    }
}

/// Clients that declared one of the given roles.
#[derive(Debug, Clone, Default)]
pub struct RoleAudience {
    roles: HashSet<String>,
}

impl RoleAudience {
    /// Admits clients whose role is in `roles`.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl Audience for RoleAudience {
    fn includes(&self, client: &ClientInfo, _notification: &OrderNotification) -> bool {
        client
            .role
            .as_ref()
            .is_some_and(|role| self.roles.contains(role))
    }
}

/// Keeps station-bound clients to their own station's orders.
///
/// Clients without a station see everything. Notifications that carry no
/// station, such as status changes, reach every client.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationAudience;

impl Audience for StationAudience {
    fn includes(&self, client: &ClientInfo, notification: &OrderNotification) -> bool {
        match (client.station.as_deref(), notification.station()) {
            (Some(client_station), Some(order_station)) => client_station == order_station,
            _ => true,
        }
    }
}
