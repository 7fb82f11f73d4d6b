//! REST writes reaching a live WebSocket client.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

async fn next_event<S>(socket: &mut S) -> serde_json::Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no frame within 5s")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_order_writes_are_pushed_to_connected_clients() {
    // Arrange
    let app = common::build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?role=kitchen"))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while app.registry.connection_count() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // Act
    let id = common::place_order(&app.router, "table-7").await;
    let (status, _) = common::patch_json(
        app.router.clone(),
        &format!("/api/v1/orders/{id}/status"),
        &serde_json::json!({ "status": "PREPARING" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Assert
    let created = next_event(&mut socket).await;
    assert_eq!(created["event"], "order:created");
    assert_eq!(created["data"]["id"], id.as_str());
    assert_eq!(created["data"]["station"], "table-7");

    let changed = next_event(&mut socket).await;
    assert_eq!(
        changed,
        serde_json::json!({
            "event": "order:statusChanged",
            "data": { "orderId": id, "status": "PREPARING" }
        })
    );

    let (_, health) = common::get_json(app.router, "/health").await;
    assert_eq!(health["connections"], 1);
}

#[tokio::test]
async fn test_failed_write_pushes_nothing() {
    let app = common::build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while app.registry.connection_count() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let (status, _) = common::post_json(
        app.router.clone(),
        "/api/v1/orders",
        &serde_json::json!({ "createdBy": "7d3f2a90-1c2b-4c4e-9a59-4f0d2b1c8e11", "items": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let id = common::place_order(&app.router, "bar").await;

    // The first frame is the later, successful write.
    let first = next_event(&mut socket).await;
    assert_eq!(first["event"], "order:created");
    assert_eq!(first["data"]["id"], id.as_str());
}
