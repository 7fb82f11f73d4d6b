//! POS Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the order
//! context, the event store and the HTTP layer depend on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod notify;
pub mod repository;
