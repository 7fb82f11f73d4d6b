//! POS Orders: order bounded context.
//!
//! Responsible for placing and revising orders, driving their status
//! lifecycle, starting online payments and deriving sales figures. Every
//! successful order write is announced through an
//! [`application::producer::OrderNotifier`].

pub mod application;
pub mod domain;
