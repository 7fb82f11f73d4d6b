//! Event store implementations of `pos_core::repository::EventRepository`.
//!
//! `PgEventRepository` persists to PostgreSQL; `InMemoryEventRepository`
//! keeps streams in process memory for local runs without a database.

pub mod memory_event_repository;
pub mod pg_event_repository;

pub use memory_event_repository::InMemoryEventRepository;
pub use pg_event_repository::{PgEventRepository, run_migrations};
