//! Integration tests for the payment endpoint.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use pos_core::error::DomainError;
use pos_orders::application::payment::{PaymentProvider, PaymentSession};
use pos_orders::domain::model::{OrderSnapshot, PaymentMethod};

struct PanickingProvider;

#[async_trait]
impl PaymentProvider for PanickingProvider {
    async fn create_payment(
        &self,
        _order: &OrderSnapshot,
        _method: PaymentMethod,
    ) -> Result<PaymentSession, DomainError> {
        panic!("provider exploded");
    }
}

#[tokio::test]
async fn test_create_payment_returns_checkout_url() {
    // Arrange
    let app = common::build_test_app();
    let id = common::place_order(&app.router, "table-4").await;

    // Act
    let (status, json) = common::post_json(
        app.router.clone(),
        "/api/v1/payment/create",
        &serde_json::json!({ "orderId": id, "paymentMethod": "MOMO" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let url = json["paymentUrl"].as_str().unwrap();
    assert!(url.starts_with("https://test-payment.momo.vn/v2/gateway/pay?"));
    assert!(url.contains("amount=115000"));
    let transaction_id = json["transactionId"].as_str().unwrap();
    assert!(transaction_id.starts_with("MOMO-"));

    let (_, order) = common::get_json(app.router, &format!("/api/v1/orders/{id}")).await;
    assert_eq!(order["paymentStatus"], "PENDING");
    assert_eq!(order["paymentMethod"], "MOMO");
    assert_eq!(order["transactionId"], transaction_id);
}

#[tokio::test]
async fn test_cash_is_not_an_online_payment() {
    let app = common::build_test_app();
    let id = common::place_order(&app.router, "table-4").await;

    let (status, json) = common::post_json(
        app.router,
        "/api/v1/payment/create",
        &serde_json::json!({ "orderId": id, "paymentMethod": "CASH" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_payment_for_unknown_order_returns_404() {
    let app = common::build_test_app();

    let (status, _) = common::post_json(
        app.router,
        "/api/v1/payment/create",
        &serde_json::json!({
            "orderId": "00000000-0000-4000-8000-000000000000",
            "paymentMethod": "VNPAY"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handler_panic_becomes_internal_error() {
    let app = common::build_test_app_with_provider(Arc::new(PanickingProvider));
    let id = common::place_order(&app.router, "table-4").await;

    let (status, json) = common::post_json(
        app.router,
        "/api/v1/payment/create",
        &serde_json::json!({ "orderId": id, "paymentMethod": "ZALOPAY" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal_error");
    assert_eq!(json["message"], "provider exploded");
}
