//! Domain error types and failure normalisation.
//!
//! Every failure that reaches a process boundary (HTTP response, socket
//! frame, log line) is first classified into an [`ErrorKind`]. Values that
//! are not recognised errors, such as panic payloads of arbitrary type, are
//! reduced to [`INTERNAL_SERVER_ERROR_MESSAGE`] so no internal detail leaks.

use std::any::Any;

use thiserror::Error;
use uuid::Uuid;

/// Generic message used for failures that carry no presentable text.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AggregateNotFound(_) => ErrorKind::NotFound,
            Self::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Closed set of failure classes understood at the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The addressed resource does not exist.
    NotFound,
    /// The write lost an optimistic concurrency race.
    Conflict,
    /// The request violated a domain rule.
    Validation,
    /// A dependency (database, transport) failed.
    Infrastructure,
    /// Anything else, including untyped failure values.
    Internal,
}

impl ErrorKind {
    /// Machine-readable code used in error bodies.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "aggregate_not_found",
            Self::Conflict => "concurrency_conflict",
            Self::Validation => "validation_error",
            Self::Infrastructure => "infrastructure_error",
            Self::Internal => "internal_error",
        }
    }
}

/// Returns the display message of a typed error.
#[must_use]
pub fn error_message(err: &(dyn std::error::Error + 'static)) -> String {
    err.to_string()
}

/// Normalises an untyped failure value, such as a panic payload, into a
/// presentable message.
///
/// Errors yield their message, strings yield themselves and every other
/// value yields [`INTERNAL_SERVER_ERROR_MESSAGE`].
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(err) = payload.downcast_ref::<DomainError>() {
        return error_message(err);
    }
    if let Some(err) = payload.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        return err.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_owned();
    }
    INTERNAL_SERVER_ERROR_MESSAGE.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_returns_display_of_error() {
        let err = DomainError::Validation("items must not be empty".into());

        assert_eq!(
            error_message(&err),
            "validation error: items must not be empty"
        );
    }

    #[test]
    fn test_panic_message_returns_error_message_for_domain_error() {
        let payload: Box<dyn Any + Send> = Box::new(DomainError::Infrastructure("db down".into()));

        assert_eq!(panic_message(&*payload), "infrastructure error: db down");
    }

    #[test]
    fn test_panic_message_returns_boxed_error_message() {
        let err: Box<dyn std::error::Error + Send + Sync> = "socket closed".into();
        let payload: Box<dyn Any + Send> = Box::new(err);

        assert_eq!(panic_message(&*payload), "socket closed");
    }

    #[test]
    fn test_panic_message_returns_owned_string_unchanged() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("order store offline"));

        assert_eq!(panic_message(&*payload), "order store offline");
    }

    #[test]
    fn test_panic_message_returns_static_str_unchanged() {
        let payload: Box<dyn Any + Send> = Box::new("boom");

        assert_eq!(panic_message(&*payload), "boom");
    }

    #[test]
    fn test_panic_message_normalises_other_values() {
        let unit: Box<dyn Any + Send> = Box::new(());
        let number: Box<dyn Any + Send> = Box::new(42_u32);
        let object: Box<dyn Any + Send> = Box::new(vec![("key", "value")]);

        assert_eq!(panic_message(&*unit), INTERNAL_SERVER_ERROR_MESSAGE);
        assert_eq!(panic_message(&*number), INTERNAL_SERVER_ERROR_MESSAGE);
        assert_eq!(panic_message(&*object), INTERNAL_SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_kind_classifies_every_variant() {
        let id = Uuid::new_v4();

        assert_eq!(DomainError::AggregateNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            DomainError::ConcurrencyConflict {
                aggregate_id: id,
                expected: 1,
                actual: 2,
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::Validation("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DomainError::Infrastructure("down".into()).kind(),
            ErrorKind::Infrastructure
        );
    }
}
