/// Local newest-first notification cache
///
/// The cache mirrors what the server last told us:
/// - a snapshot replaces everything, order included
/// - an incremental push goes to the front
/// - a read-ack flips `is_read` and nothing ever flips it back
use crate::models::{NotificationRecord, NotificationType};

#[derive(Debug, Clone, Default)]
pub struct NotificationCache {
    records: Vec<NotificationRecord>,
}

impl NotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with a server snapshot, keeping the server's order
    pub fn replace(&mut self, snapshot: Vec<NotificationRecord>) {
        self.records = snapshot;
    }

    pub fn prepend(&mut self, record: NotificationRecord) {
        self.records.insert(0, record);
    }

    /// Mark `id` as read.
    ///
    /// Returns `false` when the id is not cached.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_read).count()
    }

    pub fn unread_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.is_read)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Owned copy of the cache, newest first
    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records.clone()
    }

    pub fn by_type(&self, kind: &NotificationType) -> Vec<NotificationRecord> {
        self.records
            .iter()
            .filter(|r| &r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<NotificationRecord> {
        self.records.iter().take(limit).cloned().collect()
    }
}
