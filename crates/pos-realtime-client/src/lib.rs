//! POS Realtime Client: subscribe to order notifications.
//!
//! [`OrderSocketClient`] keeps one WebSocket connection to the order channel
//! alive, reconnecting with exponential backoff. Any number of independent
//! subscriptions share that connection; each returns a
//! [`SubscriptionHandle`] that removes exactly its own callbacks when
//! dropped.

pub mod connection;
pub mod error;
pub mod subscription;

pub use connection::{ClientConfig, OrderSocketClient};
pub use error::ClientError;
pub use subscription::{ConnectionState, OrderCallbacks, OrderSubscriptions, SubscriptionHandle};
