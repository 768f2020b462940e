/// Real-time notification channel
///
/// Owns at most one live push connection, a newest-first cache of the
/// user's notifications, and the subscribers watching that cache.
///
/// Architecture:
/// 1. `NotificationChannel`: public command/query surface, never fails
/// 2. `driver`: per-connection task running the connect/dispatch/backoff loop
/// 3. `subscribers`: snapshot callbacks, invoked outside the state lock with
///    panics contained
/// 4. `toast`: sink for transient user-facing messages
mod driver;
mod subscribers;
mod toast;

pub use subscribers::{SnapshotCallback, SubscriberId};
pub use toast::{ToastSink, TracingToasts};

use crate::cache::NotificationCache;
use crate::config::ChannelConfig;
use crate::models::{ConnectionStatus, NotificationRecord, NotificationType, Toast};
use crate::websocket::{ClientEvent, Connector, WsConnector};
use parking_lot::{Mutex, ReentrantMutex};
use resilience::RetryState;
use std::sync::{Arc, Weak};
use std::time::Duration;
use subscribers::{deliver, invoke, SubscriberRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Driver lifecycle, finer than the public [`ConnectionStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    Connected,
    /// Waiting out a backoff delay before the next attempt
    Backoff,
}

impl Phase {
    fn status(self) -> ConnectionStatus {
        match self {
            Phase::Idle | Phase::Backoff => ConnectionStatus::Disconnected,
            Phase::Connecting => ConnectionStatus::Connecting,
            Phase::Connected => ConnectionStatus::Connected,
        }
    }
}

struct State {
    phase: Phase,
    /// Bumped on every connect and teardown; drivers from older sessions
    /// must not touch state
    session: u64,
    cache: NotificationCache,
    subscribers: SubscriberRegistry,
    retry: RetryState,
    outbound: Option<mpsc::UnboundedSender<ClientEvent>>,
    driver: Option<JoinHandle<()>>,
}

impl State {
    /// A driver handle is held and its task has not exited
    fn driver_alive(&self) -> bool {
        self.driver.as_ref().is_some_and(|driver| !driver.is_finished())
    }

    /// Public status; a driver that died without cleaning up reads as offline
    fn status(&self) -> ConnectionStatus {
        if self.phase != Phase::Idle && !self.driver_alive() {
            return ConnectionStatus::Disconnected;
        }
        self.phase.status()
    }

    /// Reset everything a session owns and hand back the driver handle
    fn teardown(&mut self) -> Option<JoinHandle<()>> {
        self.session += 1;
        self.phase = Phase::Idle;
        self.outbound = None;
        self.cache.clear();
        self.subscribers.clear();
        self.retry.reset();
        self.driver.take()
    }
}

pub(crate) struct Shared {
    config: ChannelConfig,
    connector: Arc<dyn Connector>,
    toasts: Arc<dyn ToastSink>,
    state: Mutex<State>,
    /// Held while snapshots are handed to subscribers, so a new subscriber's
    /// initial snapshot and later updates arrive in cache order. Always taken
    /// before `state`; reentrant so callbacks may subscribe.
    delivery: ReentrantMutex<()>,
}

/// What the driver should do after applying an inbound event
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Continue,
    /// Session is no longer current
    Stale,
}

impl Shared {
    fn status(&self) -> ConnectionStatus {
        self.state.lock().status()
    }

    /// Enter `Connecting` for a new attempt, false if the session is stale
    pub(crate) fn begin_attempt(&self, session: u64) -> bool {
        let mut state = self.state.lock();
        if state.session != session {
            return false;
        }
        state.phase = Phase::Connecting;
        true
    }

    pub(crate) fn on_connected(
        &self,
        session: u64,
        outbound: mpsc::UnboundedSender<ClientEvent>,
    ) -> bool {
        let mut state = self.state.lock();
        if state.session != session {
            return false;
        }
        state.retry.reset();
        state.phase = Phase::Connected;
        state.outbound = Some(outbound);
        true
    }

    pub(crate) fn replace_all(&self, session: u64, records: Vec<NotificationRecord>) -> Flow {
        self.mutate_and_publish(session, |cache| {
            debug!(count = records.len(), "Received notification snapshot");
            cache.replace(records);
            true
        })
    }

    pub(crate) fn push(&self, session: u64, record: NotificationRecord) -> Flow {
        let toast = Toast::for_notification(&record);
        debug!(id = %record.id, kind = %record.kind, "Received new notification");

        let flow = self.mutate_and_publish(session, |cache| {
            cache.prepend(record);
            true
        });
        if flow == Flow::Continue {
            if let Some(toast) = toast {
                self.toasts.show(toast);
            }
        }
        flow
    }

    pub(crate) fn confirm_read(&self, session: u64, id: &str) -> Flow {
        self.mutate_and_publish(session, |cache| {
            let found = cache.mark_read(id);
            if !found {
                debug!(id, "Read confirmation for unknown notification");
            }
            found
        })
    }

    /// Apply `mutate` to the cache and, if it reports a change, push the new
    /// snapshot to every subscriber after releasing the lock.
    fn mutate_and_publish<F>(&self, session: u64, mutate: F) -> Flow
    where
        F: FnOnce(&mut NotificationCache) -> bool,
    {
        let _delivering = self.delivery.lock();
        let pending = {
            let mut state = self.state.lock();
            if state.session != session {
                return Flow::Stale;
            }
            if !mutate(&mut state.cache) {
                return Flow::Continue;
            }
            (state.subscribers.callbacks(), state.cache.snapshot())
        };

        let (callbacks, snapshot) = pending;
        deliver(callbacks, snapshot);
        Flow::Continue
    }

    /// Record a failed attempt or dropped connection.
    ///
    /// Returns the delay before the next attempt, or `None` when the session
    /// is stale or the retry budget is spent.
    pub(crate) fn schedule_reconnect(&self, session: u64) -> Option<Duration> {
        let exhausted = {
            let mut state = self.state.lock();
            if state.session != session {
                return None;
            }
            state.outbound = None;
            match state.retry.next_delay() {
                Ok(delay) => {
                    state.phase = Phase::Backoff;
                    info!(
                        attempt = state.retry.attempts(),
                        max_attempts = state.retry.config().max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling notification channel reconnect"
                    );
                    return Some(delay);
                }
                Err(e) => e,
            }
        };

        self.give_up(session, &exhausted);
        None
    }

    /// Stop retrying for `session`; the cache stays readable until the next
    /// connect or disconnect.
    pub(crate) fn give_up(&self, session: u64, reason: &dyn std::fmt::Display) {
        {
            let mut state = self.state.lock();
            if state.session != session {
                return;
            }
            state.phase = Phase::Idle;
            state.outbound = None;
            // Detach; this is the driver's own handle
            drop(state.driver.take());
        }

        error!(reason = %reason, "Giving up on notification channel");
        self.toasts.show(Toast::connection_lost());
    }

    /// Terminal auth failure for `session`: toast once, then tear down
    pub(crate) fn reject_session(&self, session: u64, reason: &str) {
        {
            let mut state = self.state.lock();
            if state.session != session {
                return;
            }
            drop(state.teardown());
        }

        warn!(reason, "Notification channel authentication rejected");
        self.toasts.show(Toast::session_expired());
    }
}

/// Client side of the real-time notification push channel.
///
/// Cloning is cheap and every clone drives the same connection. None of the
/// methods return errors: failures show up in [`connection_status`] and as
/// toasts.
///
/// [`connection_status`]: NotificationChannel::connection_status
#[derive(Clone)]
pub struct NotificationChannel {
    shared: Arc<Shared>,
}

impl NotificationChannel {
    pub fn new(
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
        toasts: Arc<dyn ToastSink>,
    ) -> Self {
        let retry = RetryState::new(config.reconnect.clone());
        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                toasts,
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    session: 0,
                    cache: NotificationCache::new(),
                    subscribers: SubscriberRegistry::default(),
                    retry,
                    outbound: None,
                    driver: None,
                }),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Channel over a real WebSocket, logging toasts
    pub fn websocket(config: ChannelConfig) -> Self {
        Self::new(config, Arc::new(WsConnector), Arc::new(TracingToasts))
    }

    /// Start the connection driver on the current tokio runtime.
    ///
    /// Logs and returns when a driver is already running. Connection failures
    /// never surface here; they feed the reconnection procedure.
    pub fn connect(&self, token: impl Into<String>, endpoint_url: impl Into<String>) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "connect() called outside a tokio runtime");
                return;
            }
        };

        let mut state = self.shared.state.lock();
        if state.driver_alive() {
            info!(
                status = %state.status(),
                "Notification channel already active, ignoring connect"
            );
            return;
        }
        if state.driver.take().is_some() {
            warn!("Previous notification driver exited unexpectedly, starting over");
        }

        state.session += 1;
        state.retry.reset();
        state.phase = Phase::Connecting;

        let session = state.session;
        let endpoint_url = endpoint_url.into();
        info!(url = %endpoint_url, session, "Starting notification channel");

        state.driver = Some(runtime.spawn(driver::run(
            self.shared.clone(),
            session,
            token.into(),
            endpoint_url,
        )));
    }

    /// Tear down the connection, cancel any pending reconnect, and drop the
    /// cache and all subscribers. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let driver = self.shared.state.lock().teardown();
        if let Some(driver) = driver {
            driver.abort();
            info!("Notification channel disconnected");
        }
    }

    /// Signal from the Auth collaborator that the token is no longer valid
    pub fn on_token_invalidated(&self) {
        let active = {
            let mut state = self.shared.state.lock();
            let active = state.driver.is_some();
            if let Some(driver) = state.teardown() {
                driver.abort();
            }
            active
        };

        if active {
            warn!("Auth token invalidated, closing notification channel");
            self.shared.toasts.show(Toast::session_expired());
        }
    }

    /// Register `callback`; it receives the current cache right away and again
    /// after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<NotificationRecord>) + Send + Sync + 'static,
    {
        let callback: SnapshotCallback = Arc::new(callback);
        let _delivering = self.shared.delivery.lock();
        let (id, snapshot) = {
            let mut state = self.shared.state.lock();
            (state.subscribers.insert(callback.clone()), state.cache.snapshot())
        };

        invoke(&callback, snapshot);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Ask the server to resend the full notification list
    pub fn request_notifications(&self) {
        self.send(ClientEvent::GetNotifications);
    }

    /// Ask the server to mark `id` read.
    ///
    /// The cache changes only when the server confirms.
    pub fn mark_as_read(&self, id: impl Into<String>) {
        self.send(ClientEvent::mark_read(id));
    }

    pub fn mark_all_as_read(&self) {
        let unread = self.shared.state.lock().cache.unread_ids();
        for id in unread {
            self.mark_as_read(id);
        }
    }

    fn send(&self, event: ClientEvent) {
        let state = self.shared.state.lock();
        match (&state.phase, &state.outbound) {
            (Phase::Connected, Some(outbound)) => {
                if outbound.send(event).is_err() {
                    warn!("Notification channel is closing, command dropped");
                }
            }
            _ => warn!(
                ?event,
                status = %state.status(),
                "Notification channel not connected, command ignored"
            ),
        }
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.shared.state.lock().cache.snapshot()
    }

    pub fn unread_count(&self) -> usize {
        self.shared.state.lock().cache.unread_count()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn notifications_by_type(&self, kind: &NotificationType) -> Vec<NotificationRecord> {
        self.shared.state.lock().cache.by_type(kind)
    }

    /// The `limit` newest notifications
    pub fn recent_notifications(&self, limit: usize) -> Vec<NotificationRecord> {
        self.shared.state.lock().cache.recent(limit)
    }

    /// Consecutive failed attempts since the last successful connection
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.lock().retry.attempts()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }
}

/// Handle returned by [`NotificationChannel::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop receiving snapshots
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.state.lock().subscribers.remove(self.id);
        }
    }
}
