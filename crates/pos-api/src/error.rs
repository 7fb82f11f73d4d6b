//! POS API error types.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pos_core::error::{DomainError, ErrorKind, panic_message};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration or other store failure at start-up.
    #[error("event store error: {0}")]
    EventStore(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Infrastructure | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(kind: ErrorKind, message: String) -> Response {
    let body = ErrorBody {
        error: kind.code(),
        message,
    };
    (status_of(kind), Json(body)).into_response()
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    /// A 400 for malformed request input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(DomainError::Validation(message.into()))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind == ErrorKind::Infrastructure {
            error!(error = %self.0, "request failed");
        }
        error_response(kind, self.0.to_string())
    }
}

/// Turns a handler panic into a 500 with the normalised panic message.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    error!(panic = %message, "request handler panicked");
    error_response(ErrorKind::Internal, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pos_core::error::INTERNAL_SERVER_ERROR_MESSAGE;
    use uuid::Uuid;

    fn status_of_error(err: DomainError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_aggregate_not_found_maps_to_404() {
        assert_eq!(
            status_of_error(DomainError::AggregateNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of_error(DomainError::ConcurrencyConflict {
                aggregate_id: Uuid::new_v4(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_with_code() {
        let response = ApiError::bad_request("date must be YYYY-MM-DD").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "validation error: date must be YYYY-MM-DD");
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of_error(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_panic_with_string_payload_keeps_message() {
        let response = panic_response(Box::new(String::from("stock ledger missing")));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "stock ledger missing");
    }

    #[tokio::test]
    async fn test_panic_with_opaque_payload_is_normalised() {
        let response = panic_response(Box::new(42_u8));

        let json = body_json(response).await;
        assert_eq!(json["message"], INTERNAL_SERVER_ERROR_MESSAGE);
    }
}
