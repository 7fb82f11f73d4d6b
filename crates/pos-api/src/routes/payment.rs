//! Routes for online payments.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use pos_orders::application::command_handlers;
use pos_orders::application::payment::PaymentSession;
use pos_orders::domain::commands;
use pos_orders::domain::model::PaymentMethod;

use crate::error::ApiError;
use crate::routes::orders::parse_order_id;
use crate::state::AppState;

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// The order to pay.
    pub order_id: String,
    /// Online provider: `VNPAY`, `MOMO` or `ZALOPAY`.
    pub payment_method: PaymentMethod,
}

/// POST /create
#[instrument(skip_all, fields(order_id = %request.order_id, method = request.payment_method.as_str()))]
async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentSession>, ApiError> {
    let command = commands::CreatePayment {
        correlation_id: Uuid::new_v4(),
        order_id: parse_order_id(&request.order_id)?,
        payment_method: request.payment_method,
    };

    info!(correlation_id = %command.correlation_id, "handling create_payment command");

    let result = command_handlers::handle_create_payment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &*state.payment_provider,
        &*state.notifier,
    )
    .await?;

    Ok(Json(result.session))
}

/// Returns the router for payments.
pub fn router() -> Router<AppState> {
    Router::new().route("/create", post(create_payment))
}
