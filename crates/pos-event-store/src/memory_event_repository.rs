//! In-process event store used when no database is configured.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use pos_core::error::DomainError;
use pos_core::repository::{EventRepository, StoredEvent};

/// Event repository holding every stream in a mutex-guarded map.
///
/// Streams live as long as the repository; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn streams(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Vec<StoredEvent>>>, DomainError> {
        self.streams
            .lock()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams()?
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        let mut events: Vec<StoredEvent> = self.streams()?.values().flatten().cloned().collect();
        events.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then(a.aggregate_id.cmp(&b.aggregate_id))
                .then(a.sequence_number.cmp(&b.sequence_number))
        });
        Ok(events)
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams()?;
        let stream = streams.entry(aggregate_id).or_default();
        let actual = stream.last().map_or(0, |e| e.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        stream.extend_from_slice(events);
        Ok(())
    }
}
