//! Command abstractions.

use uuid::Uuid;

/// An intent to change state, traced end to end by its correlation id.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable command name used in logs.
    fn command_type(&self) -> &'static str;

    /// Correlation ID shared by the command and every event it produces.
    fn correlation_id(&self) -> Uuid;

    /// Causation ID stamped on events produced directly by this command.
    fn causation_id(&self) -> Uuid {
        self.correlation_id()
    }
}
