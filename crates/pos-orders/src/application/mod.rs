//! Application services for the order context.

pub mod command_handlers;
pub mod dashboard;
pub mod payment;
pub mod producer;
pub mod query_handlers;
