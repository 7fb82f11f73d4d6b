//! POS Realtime: the server side of the order notification channel.
//!
//! A [`ConnectionRegistry`] owns the live set of WebSocket connections. The
//! [`SocketGateway`] serializes each order notification once and queues it
//! on every connection its [`Audience`] selects. Delivery is best-effort:
//! a full or closed connection misses the frame and nothing is retried.

pub mod audience;
pub mod gateway;
pub mod protocol;
pub mod registry;
pub mod ws_server;

pub use audience::{Audience, Everyone, RoleAudience, StationAudience};
pub use gateway::SocketGateway;
pub use registry::{ClientInfo, Connection, ConnectionId, ConnectionRegistry};
