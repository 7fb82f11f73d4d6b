//! Shared test doubles for the POS order service.

mod clock;
mod notifier;
mod repository;

pub use clock::FixedClock;
pub use notifier::{FailingNotifier, RecordingNotifier};
pub use repository::{EmptyEventRepository, FailingEventRepository, RecordingEventRepository};
