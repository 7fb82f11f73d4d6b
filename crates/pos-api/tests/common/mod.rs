//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pos_core::clock::Clock;
use pos_event_store::InMemoryEventRepository;
use pos_orders::application::payment::{PaymentProvider, RedirectPaymentProvider};
use pos_realtime::{ConnectionRegistry, SocketGateway};
use pos_test_support::FixedClock;
use tower::ServiceExt;

use pos_api::app::build_router;
use pos_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// The assembled router and the registry its gateway fans out to.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<ConnectionRegistry>,
}

/// Build the full app with an in-memory event store, a fixed clock and the
/// sandbox payment provider. Uses the same router as `main.rs`.
pub fn build_test_app() -> TestApp {
    build_test_app_with_provider(Arc::new(RedirectPaymentProvider::sandbox().unwrap()))
}

/// Build the full app with a custom payment provider.
pub fn build_test_app_with_provider(payment_provider: Arc<dyn PaymentProvider>) -> TestApp {
    let registry = Arc::new(ConnectionRegistry::new());
    let gateway = Arc::new(SocketGateway::new(Arc::clone(&registry)));
    let state = AppState::with_gateway(
        fixed_clock(),
        Arc::new(InMemoryEventRepository::new()),
        payment_provider,
        gateway,
    );
    TestApp {
        router: build_router(state),
        registry,
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request("POST", uri, body)).await
}

/// Send a PATCH request with a JSON body and return the response.
pub async fn patch_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request("PATCH", uri, body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// A two-line order body: 2 x 50 000 + 1 x 15 000.
pub fn order_body(station: &str) -> serde_json::Value {
    serde_json::json!({
        "createdBy": "7d3f2a90-1c2b-4c4e-9a59-4f0d2b1c8e11",
        "items": [
            { "productId": "bun-cha", "name": "Bun cha", "quantity": 2, "unitPrice": 50000 },
            { "productId": "tra-da", "name": "Tra da", "quantity": 1, "unitPrice": 15000 }
        ],
        "station": station
    })
}

/// Places an order and returns its id.
pub async fn place_order(app: &Router, station: &str) -> String {
    let (status, json) = post_json(app.clone(), "/api/v1/orders", &order_body(station)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["id"].as_str().unwrap().to_owned()
}
