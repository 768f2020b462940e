use crate::models::NotificationRecord;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Callback receiving an owned snapshot of the cache
pub type SnapshotCallback = Arc<dyn Fn(Vec<NotificationRecord>) + Send + Sync>;

/// Unique identifier for a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration-ordered list of snapshot callbacks
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    entries: Vec<(SubscriberId, SnapshotCallback)>,
}

impl SubscriberRegistry {
    pub fn insert(&mut self, callback: SnapshotCallback) -> SubscriberId {
        let id = SubscriberId::new();
        self.entries.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clone the callbacks so they can be invoked without holding a lock
    pub fn callbacks(&self) -> Vec<SnapshotCallback> {
        self.entries.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

/// Deliver one snapshot to every callback, each getting its own copy
pub(crate) fn deliver(callbacks: Vec<SnapshotCallback>, snapshot: Vec<NotificationRecord>) {
    let Some((last, rest)) = callbacks.split_last() else {
        return;
    };
    for callback in rest {
        invoke(callback, snapshot.clone());
    }
    invoke(last, snapshot);
}

/// Run one callback; a panic is logged and contained so the caller (usually
/// the connection driver) keeps going.
pub(crate) fn invoke(callback: &SnapshotCallback, snapshot: Vec<NotificationRecord>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        error!(reason = panic_message(&*payload), "Notification subscriber panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
