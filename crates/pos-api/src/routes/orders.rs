//! Routes for the order context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use pos_orders::application::{command_handlers, query_handlers};
use pos_orders::domain::commands;
use pos_orders::domain::model::{OrderChanges, OrderItem, OrderSnapshot, OrderStatus, PaymentMethod};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// The staff member placing the order.
    pub created_by: Uuid,
    /// Ordered lines.
    pub items: Vec<OrderItem>,
    /// Payment method; cash unless given.
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    /// Table, counter or kitchen line.
    #[serde(default)]
    pub station: Option<String>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

/// Request body for PATCH /{id}/status.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    /// Target status.
    pub status: OrderStatus,
}

/// Query string of GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    /// Only orders in this status.
    pub status: Option<String>,
}

/// Parses an order id from a path or body.
///
/// # Errors
///
/// Returns a 400 `ApiError` if `raw` is not a UUID.
pub(crate) fn parse_order_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid order id: {raw}")))
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| ApiError::bad_request(format!("unknown order status: {raw}")))
}

/// POST /
#[instrument(skip_all, fields(created_by = %request.created_by))]
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderSnapshot>), ApiError> {
    let command = commands::CreateOrder {
        correlation_id: Uuid::new_v4(),
        created_by: request.created_by,
        items: request.items,
        payment_method: request.payment_method,
        station: request.station,
        note: request.note,
    };

    info!(correlation_id = %command.correlation_id, "handling create_order command");

    let result = command_handlers::handle_create_order(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &*state.notifier,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(result.order)))
}

/// GET /
#[instrument(skip_all)]
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSnapshot>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = query_handlers::list_orders(status, &*state.event_repository).await?;
    Ok(Json(orders))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = query_handlers::get_order_by_id(order_id, &*state.event_repository).await?;
    Ok(Json(order))
}

/// PATCH /{id}
#[instrument(skip(state, changes))]
async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<OrderChanges>,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let command = commands::UpdateOrder {
        correlation_id: Uuid::new_v4(),
        order_id: parse_order_id(&id)?,
        changes,
    };

    info!(correlation_id = %command.correlation_id, "handling update_order command");

    let result = command_handlers::handle_update_order(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &*state.notifier,
    )
    .await?;

    Ok(Json(result.order))
}

/// PATCH /{id}/status
#[instrument(skip(state, request), fields(status = ?request.status))]
async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let command = commands::ChangeOrderStatus {
        correlation_id: Uuid::new_v4(),
        order_id: parse_order_id(&id)?,
        status: request.status,
    };

    info!(correlation_id = %command.correlation_id, "handling change_order_status command");

    let result = command_handlers::handle_change_order_status(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &*state.notifier,
    )
    .await?;

    Ok(Json(result.order))
}

/// Returns the router for the order context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order).patch(update_order))
        .route("/{id}/status", patch(change_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use pos_core::repository::EventRepository;
    use pos_orders::application::payment::RedirectPaymentProvider;
    use pos_orders::domain::notifications::OrderNotification;
    use pos_realtime::ConnectionRegistry;
    use pos_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, RecordingNotifier,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(
        event_repository: Arc<dyn EventRepository>,
        notifier: Arc<RecordingNotifier<OrderNotification>>,
    ) -> AppState {
        AppState::new(
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
            event_repository,
            notifier,
            Arc::new(RedirectPaymentProvider::sandbox().unwrap()),
            Arc::new(ConnectionRegistry::new()),
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap_or(Value::Null))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_order_returns_201_and_announces() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::new());
        let app = router().with_state(app_state_with(
            Arc::new(EmptyEventRepository),
            Arc::clone(&notifier),
        ));
        let body = serde_json::json!({
            "createdBy": Uuid::new_v4(),
            "items": [{ "productId": "bun-cha", "name": "Bun cha", "quantity": 2, "unitPrice": 50000 }],
            "station": "table-3"
        });

        // Act
        let (status, json) = send(app, json_request("POST", "/", &body)).await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["total"], 100_000);
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["paymentMethod"], "CASH");
        assert_eq!(json["createdAt"], "2026-01-15T10:00:00Z");
        let published = notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_name(), "order:created");
    }

    #[tokio::test]
    async fn test_create_order_with_no_items_returns_400() {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = router().with_state(app_state_with(
            Arc::new(EmptyEventRepository),
            Arc::clone(&notifier),
        ));
        let body = serde_json::json!({ "createdBy": Uuid::new_v4(), "items": [] });

        let (status, json) = send(app, json_request("POST", "/", &body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert!(notifier.published().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_store_failure_returns_500_without_announcing() {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = router().with_state(app_state_with(
            Arc::new(FailingEventRepository),
            Arc::clone(&notifier),
        ));
        let body = serde_json::json!({
            "createdBy": Uuid::new_v4(),
            "items": [{ "productId": "tra", "name": "Tra", "quantity": 1, "unitPrice": 10000 }]
        });

        let (status, json) = send(app, json_request("POST", "/", &body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
        assert!(notifier.published().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_order_returns_404() {
        let app = router().with_state(app_state_with(
            Arc::new(EmptyEventRepository),
            Arc::new(RecordingNotifier::new()),
        ));
        let request = Request::builder()
            .uri(format!("/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_malformed_order_id_returns_400() {
        let app = router().with_state(app_state_with(
            Arc::new(EmptyEventRepository),
            Arc::new(RecordingNotifier::new()),
        ));
        let body = serde_json::json!({ "status": "READY" });

        let (status, json) = send(app, json_request("PATCH", "/ord-abc/status", &body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_list_orders_rejects_unknown_status_filter() {
        let app = router().with_state(app_state_with(
            Arc::new(EmptyEventRepository),
            Arc::new(RecordingNotifier::new()),
        ));
        let request = Request::builder()
            .uri("/?status=EATEN")
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "validation error: unknown order status: EATEN");
    }
}
