//! Shared fixtures: a scripted in-memory connector and a toast recorder.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use notification_channel::channel::ToastSink;
use notification_channel::config::ChannelConfig;
use notification_channel::models::Toast;
use notification_channel::websocket::Connection;
use notification_channel::{
    ChannelError, ClientEvent, Connector, NotificationChannel, NotificationRecord,
    NotificationType, ServerEvent, Subscription,
};
use resilience::RetryConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of the next `connect` call
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Accept,
    Fail,
    RejectAuth,
    /// Never completes, so the connect timeout fires
    Hang,
}

/// Server end of an accepted in-memory connection
pub struct ServerSide {
    pub from_client: UnboundedReceiver<ClientEvent>,
    pub to_client: UnboundedSender<Result<ServerEvent, ChannelError>>,
}

impl ServerSide {
    pub fn push(&self, event: ServerEvent) {
        self.to_client
            .unbounded_send(Ok(event))
            .expect("client stream dropped");
    }

    pub fn push_err(&self, error: ChannelError) {
        self.to_client
            .unbounded_send(Err(error))
            .expect("client stream dropped");
    }

    pub async fn expect_command(&mut self) -> ClientEvent {
        self.from_client.next().await.expect("client hung up")
    }
}

/// Record of one `connect` call
pub struct Attempt {
    pub at: Instant,
    pub server: Option<ServerSide>,
}

impl Attempt {
    pub fn accepted(self) -> ServerSide {
        self.server.expect("attempt was not accepted")
    }
}

/// Connector that follows a script; attempts past its end fail
pub struct MockConnector {
    script: Mutex<VecDeque<Script>>,
    attempts: tokio::sync::mpsc::UnboundedSender<Attempt>,
}

impl MockConnector {
    pub fn new(
        script: impl IntoIterator<Item = Script>,
    ) -> (Arc<Self>, tokio::sync::mpsc::UnboundedReceiver<Attempt>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            attempts: tx,
        });
        (connector, rx)
    }

    pub fn push_script(&self, step: Script) {
        self.script.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _endpoint_url: &str, _token: &str) -> notification_channel::Result<Connection> {
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Script::Fail);
        let at = Instant::now();

        match step {
            Script::Accept => {
                let (client_tx, server_rx) = unbounded::<ClientEvent>();
                let (server_tx, client_rx) = unbounded::<Result<ServerEvent, ChannelError>>();
                let _ = self.attempts.send(Attempt {
                    at,
                    server: Some(ServerSide {
                        from_client: server_rx,
                        to_client: server_tx,
                    }),
                });

                let sink = client_tx.sink_map_err(|e| ChannelError::Transport(e.to_string()));
                Ok(Connection::new(Box::pin(sink), client_rx.boxed()))
            }
            Script::Fail => {
                let _ = self.attempts.send(Attempt { at, server: None });
                Err(ChannelError::Transport("connection refused".to_string()))
            }
            Script::RejectAuth => {
                let _ = self.attempts.send(Attempt { at, server: None });
                Err(ChannelError::AuthRejected("handshake returned 401".to_string()))
            }
            Script::Hang => {
                let _ = self.attempts.send(Attempt { at, server: None });
                futures::future::pending().await
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingToasts {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToasts {
    pub fn all(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.all().into_iter().map(|t| t.title).collect()
    }
}

impl ToastSink for RecordingToasts {
    fn show(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

pub struct Harness {
    pub channel: NotificationChannel,
    pub connector: Arc<MockConnector>,
    pub attempts: tokio::sync::mpsc::UnboundedReceiver<Attempt>,
    pub toasts: Arc<RecordingToasts>,
}

pub fn test_config(max_retries: u32, base: Duration) -> ChannelConfig {
    ChannelConfig {
        reconnect: RetryConfig {
            max_retries,
            initial_backoff: base,
            max_backoff: Duration::from_secs(600),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        connect_timeout: Duration::from_secs(10),
    }
}

pub fn harness(script: impl IntoIterator<Item = Script>) -> Harness {
    harness_with(test_config(5, Duration::from_secs(1)), script)
}

pub fn harness_with(config: ChannelConfig, script: impl IntoIterator<Item = Script>) -> Harness {
    let (connector, attempts) = MockConnector::new(script);
    let toasts = Arc::new(RecordingToasts::default());
    let channel = NotificationChannel::new(config, connector.clone(), toasts.clone());
    Harness {
        channel,
        connector,
        attempts,
        toasts,
    }
}

impl Harness {
    pub fn connect(&self) {
        self.channel.connect("test-token", "ws://notifications.test/ws");
    }

    pub async fn next_attempt(&mut self) -> Attempt {
        self.attempts.recv().await.expect("connector dropped")
    }

    /// Connect and complete the implicit snapshot request with `records`
    pub async fn connect_with(&mut self, records: Vec<NotificationRecord>) -> ServerSide {
        self.connect();
        let mut server = self.next_attempt().await.accepted();
        assert_eq!(server.expect_command().await, ClientEvent::GetNotifications);

        let (subscription, mut snapshots) = snapshots(&self.channel);
        snapshots.recv().await.expect("initial snapshot");
        server.push(ServerEvent::NotificationsList(records));
        snapshots.recv().await.expect("snapshot after list");
        subscription.unsubscribe();

        server
    }
}

/// Subscribe and forward every snapshot into a channel
pub fn snapshots(
    channel: &NotificationChannel,
) -> (
    Subscription,
    tokio::sync::mpsc::UnboundedReceiver<Vec<NotificationRecord>>,
) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = channel.subscribe(move |snapshot| {
        let _ = tx.send(snapshot);
    });
    (subscription, rx)
}

/// Let spawned tasks run without letting the paused clock advance
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn record(id: &str, kind: NotificationType, is_read: bool, minute: i64) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        kind,
        title: format!("Title {id}"),
        message: format!("Message {id}"),
        is_read,
        created_at: Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()
            + ChronoDuration::minutes(minute),
        related_user: None,
        related_event_id: None,
    }
}

pub fn ids(records: &[NotificationRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}
