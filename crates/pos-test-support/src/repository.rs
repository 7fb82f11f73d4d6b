//! `EventRepository` doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use pos_core::error::DomainError;
use pos_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

/// Serves a seeded event log and records every append.
///
/// Loads are filtered by aggregate like a real store. Appends are recorded
/// verbatim and are not folded back into the seeded log, so a handler test
/// sees exactly the history it arranged.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    seeded: Vec<StoredEvent>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Creates a repository with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository whose log holds `events`.
    #[must_use]
    pub fn with_events(events: Vec<StoredEvent>) -> Self {
        Self {
            seeded: events,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Every `(aggregate_id, expected_version, events)` append, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .seeded
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        let mut events = self.seeded.clone();
        events.sort_by_key(|e| (e.occurred_at, e.sequence_number));
        Ok(events)
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// Has no events and accepts every append.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(Vec::new())
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(Vec::new())
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Fails every call with an infrastructure error.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("database unreachable".into()))
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("database unreachable".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("database unreachable".into()))
    }
}
