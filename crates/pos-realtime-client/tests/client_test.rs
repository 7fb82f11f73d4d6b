//! The client against a live gateway.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pos_orders::domain::model::{OrderId, OrderSnapshot, OrderStatus, PaymentMethod, PaymentStatus};
use pos_orders::domain::notifications::{OrderNotification, OrderStatusChange};
use pos_realtime::{ConnectionRegistry, SocketGateway, ws_server};
use pos_realtime_client::{ClientConfig, ConnectionState, OrderCallbacks, OrderSocketClient};
use tokio::sync::mpsc;

async fn start_gateway() -> (SocketGateway, String) {
    let registry = Arc::new(ConnectionRegistry::new());
    let app = ws_server::routes().with_state(Arc::clone(&registry));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (SocketGateway::new(registry), format!("ws://{addr}/ws"))
}

async fn wait_for_connections(registry: &ConnectionRegistry, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.connection_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count never reached");
}

fn order(id: &str) -> OrderSnapshot {
    let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
    OrderSnapshot {
        id: OrderId::new(id),
        items: Vec::new(),
        total: 12_000,
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Unpaid,
        created_by: uuid::Uuid::new_v4(),
        station: Some("bar".into()),
        note: None,
        transaction_id: None,
        created_at: at,
        updated_at: at,
        version: 1,
    }
}

#[tokio::test]
async fn test_status_change_reaches_subscriber_over_the_wire() {
    // Arrange
    let (gateway, url) = start_gateway().await;
    let client = OrderSocketClient::connect(ClientConfig::new(url).with_role("kitchen")).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let created_tx = tx.clone();
    let _handle = client.subscribe(
        OrderCallbacks::new()
            .on_status_changed(move |change| {
                let _ = tx.send(format!("{}:{:?}", change.order_id, change.status));
            })
            .on_created(move |order| {
                let _ = created_tx.send(format!("created:{}", order.id));
            }),
    );
    client
        .wait_until_connected(Duration::from_secs(5))
        .await
        .unwrap();
    wait_for_connections(gateway.registry(), 1).await;

    // Act
    gateway
        .emit(&OrderNotification::StatusChanged(OrderStatusChange {
            order_id: OrderId::new("ord_123"),
            status: OrderStatus::Preparing,
        }))
        .unwrap();
    gateway
        .emit(&OrderNotification::Created(order("ord_124")))
        .unwrap();

    // Assert
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("ord_123:Preparing"));
    assert_eq!(second.as_deref(), Some("created:ord_124"));
    assert_eq!(client.state(), ConnectionState::Connected);

    client.close().await;
    wait_for_connections(gateway.registry(), 0).await;
}

#[tokio::test]
async fn test_clones_share_one_connection() {
    let (gateway, url) = start_gateway().await;
    let client = OrderSocketClient::connect(ClientConfig::new(url)).unwrap();
    let second = client.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = second.subscribe(OrderCallbacks::new().on_updated(move |order| {
        let _ = tx.send(order.id.clone());
    }));

    client
        .wait_until_connected(Duration::from_secs(5))
        .await
        .unwrap();
    wait_for_connections(gateway.registry(), 1).await;
    gateway
        .emit(&OrderNotification::Updated(order("ord_5")))
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(received, Some(OrderId::new("ord_5")));
    assert_eq!(gateway.registry().connection_count(), 1);
    second.close().await;
}

#[tokio::test]
async fn test_client_reconnects_after_server_drops_it() {
    // Arrange
    let (gateway, url) = start_gateway().await;
    let mut config = ClientConfig::new(url);
    config.initial_backoff = Duration::from_millis(20);
    let client = OrderSocketClient::connect(config).unwrap();
    client
        .wait_until_connected(Duration::from_secs(5))
        .await
        .unwrap();
    wait_for_connections(gateway.registry(), 1).await;

    // Act
    gateway.registry().close_all();

    // Assert
    wait_for_connections(gateway.registry(), 1).await;
    client
        .wait_until_connected(Duration::from_secs(5))
        .await
        .unwrap();
    client.close().await;
}
