//! End-to-end tests against a local tokio-tungstenite server.
//!
//! Each test binds an ephemeral port, so they can run in parallel.

mod common;

use common::*;
use futures_util::{SinkExt, StreamExt};
use notification_channel::{ConnectionStatus, NotificationChannel, WsConnector};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const WAIT: Duration = Duration::from_secs(5);

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

/// Accept one client and report its Authorization header
async fn accept(listener: &TcpListener) -> (WebSocketStream<TcpStream>, Option<String>) {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client never connected")
        .unwrap();

    let (header_tx, header_rx) = oneshot::channel();
    let ws = tokio_tungstenite::accept_hdr_async(stream, |request: &Request, response: Response| {
        let header = request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let _ = header_tx.send(header);
        Ok::<_, ErrorResponse>(response)
    })
    .await
    .unwrap();

    (ws, header_rx.await.unwrap())
}

/// Accept one client and refuse its handshake with 401
async fn refuse(listener: &TcpListener) {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client never connected")
        .unwrap();

    let result = tokio_tungstenite::accept_hdr_async(stream, |_: &Request, _: Response| {
        let rejection: ErrorResponse = tokio_tungstenite::tungstenite::http::Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Some("invalid token".to_string()))
            .unwrap();
        Err::<Response, _>(rejection)
    })
    .await;
    assert!(result.is_err());
}

async fn read_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let frame = timeout(WAIT, ws.next())
            .await
            .expect("no frame from client")
            .expect("client closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

fn ws_channel(max_retries: u32, base: Duration) -> (NotificationChannel, Arc<RecordingToasts>) {
    let toasts = Arc::new(RecordingToasts::default());
    let channel = NotificationChannel::new(
        test_config(max_retries, base),
        Arc::new(WsConnector),
        toasts.clone(),
    );
    (channel, toasts)
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn test_full_session_over_websocket() {
    let (listener, url) = bind().await;
    let (channel, toasts) = ws_channel(5, Duration::from_millis(50));
    let (_subscription, mut updates) = snapshots(&channel);
    updates.recv().await.unwrap();

    channel.connect("secret", url);
    let (mut ws, header) = accept(&listener).await;
    assert_eq!(header.as_deref(), Some("Bearer secret"));

    assert_eq!(read_json(&mut ws).await, json!({ "event": "get_notifications" }));

    send_json(
        &mut ws,
        json!({
            "event": "notifications_list",
            "data": [
                {
                    "_id": "n2",
                    "type": "friend_request",
                    "title": "Friend request",
                    "message": "Ana wants to connect",
                    "isRead": false,
                    "createdAt": "2026-05-02T10:00:00Z",
                    "relatedUser": { "name": "Ana" }
                },
                {
                    "_id": "n1",
                    "type": "wishlist_threshold",
                    "title": "Halfway there",
                    "message": "Birthday list is 50% pledged",
                    "isRead": true,
                    "createdAt": "2026-05-01T10:00:00Z"
                }
            ]
        }),
    )
    .await;
    let snapshot = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
    assert_eq!(ids(&snapshot), vec!["n2", "n1"]);
    assert!(channel.is_connected());

    // Binary frames and garbage text are skipped
    ws.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    ws.send(Message::text("{not json")).await.unwrap();

    send_json(
        &mut ws,
        json!({
            "event": "new_notification",
            "data": {
                "id": "n3",
                "type": "gift_received",
                "title": "New pledge",
                "message": "Sam pledged the kettle",
                "createdAt": "2026-05-03T10:00:00Z"
            }
        }),
    )
    .await;
    let snapshot = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
    assert_eq!(ids(&snapshot), vec!["n3", "n2", "n1"]);
    assert_eq!(channel.unread_count(), 2);
    assert_eq!(toasts.titles(), vec!["New pledge"]);

    channel.mark_as_read("n3");
    assert_eq!(
        read_json(&mut ws).await,
        json!({ "event": "mark_notification_read", "data": "n3" })
    );
    send_json(
        &mut ws,
        json!({ "event": "notification_marked_read", "data": { "notificationId": "n3" } }),
    )
    .await;
    timeout(WAIT, updates.recv()).await.unwrap().unwrap();
    assert_eq!(channel.unread_count(), 1);

    channel.disconnect();
    // Server sees the client go away
    let closed = timeout(WAIT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
    assert_eq!(channel.connection_status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_handshake_401_is_not_retried() {
    let (listener, url) = bind().await;
    let (channel, toasts) = ws_channel(5, Duration::from_millis(50));

    channel.connect("expired", url);
    refuse(&listener).await;

    eventually(|| toasts.titles() == vec!["Session expired"]).await;
    assert_eq!(channel.connection_status(), ConnectionStatus::Disconnected);

    // Several backoff periods pass without a new attempt
    assert!(timeout(Duration::from_millis(500), listener.accept())
        .await
        .is_err());
}

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    let (listener, url) = bind().await;
    let (channel, toasts) = ws_channel(5, Duration::from_millis(50));

    channel.connect("secret", url);
    let (mut ws, _) = accept(&listener).await;
    read_json(&mut ws).await;
    ws.close(None).await.unwrap();
    drop(ws);

    let (mut ws, header) = accept(&listener).await;
    assert_eq!(header.as_deref(), Some("Bearer secret"));
    assert_eq!(read_json(&mut ws).await, json!({ "event": "get_notifications" }));
    eventually(|| channel.is_connected()).await;
    assert_eq!(channel.reconnect_attempts(), 0);
    assert!(toasts.all().is_empty());

    channel.disconnect();
}

#[tokio::test]
async fn test_auth_error_event_closes_session() {
    let (listener, url) = bind().await;
    let (channel, toasts) = ws_channel(5, Duration::from_millis(50));

    channel.connect("secret", url);
    let (mut ws, _) = accept(&listener).await;
    read_json(&mut ws).await;
    send_json(
        &mut ws,
        json!({ "event": "connect_error", "data": { "message": "Authentication error" } }),
    )
    .await;

    eventually(|| toasts.titles() == vec!["Session expired"]).await;
    assert!(timeout(Duration::from_millis(500), listener.accept())
        .await
        .is_err());
}

#[tokio::test]
async fn test_unreachable_server_gives_up() {
    // Bind then drop to get a port nobody listens on
    let (listener, url) = bind().await;
    drop(listener);

    let (channel, toasts) = ws_channel(2, Duration::from_millis(20));
    channel.connect("secret", url);

    eventually(|| toasts.titles() == vec!["Connection lost"]).await;
    assert_eq!(channel.connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(channel.reconnect_attempts(), 2);
}
