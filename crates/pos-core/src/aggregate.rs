//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// An event-sourced aggregate: state is rebuilt by replaying its stream and
/// changed only by recording new events.
pub trait AggregateRoot: Send + Sync {
    /// Event type recorded into and replayed from the aggregate stream.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Number of persisted events already applied.
    fn version(&self) -> i64;

    /// Folds one event into the aggregate state.
    fn apply(&mut self, event: &Self::Event);

    /// Events recorded since the aggregate was loaded.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Drops recorded events once they have been persisted.
    fn clear_uncommitted_events(&mut self);

    /// Sequence number the next recorded event must carry.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version() + self.uncommitted_events().len() as i64 + 1
    }

    /// Folds the recorded events into the aggregate after they were
    /// persisted, so the in-memory state matches the stored stream.
    fn mark_committed(&mut self)
    where
        Self::Event: Clone,
    {
        let recorded = self.uncommitted_events().to_vec();
        for event in &recorded {
            self.apply(event);
        }
        self.clear_uncommitted_events();
    }
}
