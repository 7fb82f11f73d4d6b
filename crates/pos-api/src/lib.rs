//! POS API: HTTP and WebSocket surface of the point-of-sale backend.
//!
//! Exposes order commands and queries, online payment start and dashboard
//! figures over REST, and the real-time order channel at `/ws`.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
