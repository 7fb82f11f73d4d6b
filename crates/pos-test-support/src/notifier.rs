//! Notifier doubles.

use std::sync::Mutex;

use pos_core::notify::{NotifyError, Notifier};

/// Keeps every published notification, in publish order.
#[derive(Debug)]
pub struct RecordingNotifier<N> {
    published: Mutex<Vec<N>>,
}

impl<N> RecordingNotifier<N> {
    /// Creates a notifier with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }
}

impl<N> Default for RecordingNotifier<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone> RecordingNotifier<N> {
    /// Everything published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<N> {
        self.published.lock().unwrap().clone()
    }
}

impl<N: Clone + Send> Notifier<N> for RecordingNotifier<N> {
    fn publish(&self, notification: &N) -> Result<usize, NotifyError> {
        self.published.lock().unwrap().push(notification.clone());
        Ok(1)
    }
}

/// Rejects every notification as if the channel were down.
#[derive(Debug, Clone, Copy)]
pub struct FailingNotifier;

impl<N> Notifier<N> for FailingNotifier {
    fn publish(&self, _notification: &N) -> Result<usize, NotifyError> {
        Err(NotifyError::Unavailable("gateway offline".into()))
    }
}
