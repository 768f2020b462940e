/// Presentation helpers for the notification bell and the notifications page.
///
/// These sit on top of [`NotificationChannel`] and hold UI policy only: what
/// the bell summarises, how the page filters, how timestamps read, and the
/// delay before a visible item is marked read.
use crate::channel::NotificationChannel;
use crate::models::{ConnectionStatus, NotificationRecord, NotificationType};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Badge text stops counting here
const BADGE_CAP: usize = 9;

/// What the bell icon shows: count badge plus the newest items
#[derive(Debug, Clone, PartialEq)]
pub struct BellSummary {
    pub unread_count: usize,
    pub recent: Vec<NotificationRecord>,
}

impl BellSummary {
    pub fn from_notifications(notifications: &[NotificationRecord], limit: usize) -> Self {
        Self {
            unread_count: notifications.iter().filter(|n| !n.is_read).count(),
            recent: notifications.iter().take(limit).cloned().collect(),
        }
    }

    /// `None` when there is nothing unread, `"9+"` past the cap
    pub fn badge(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            n if n > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
            n => Some(n.to_string()),
        }
    }
}

/// Live/offline indicator refreshed by periodic status checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionBadge {
    Live,
    Connecting,
    Offline,
}

impl ConnectionBadge {
    pub fn from_status(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => ConnectionBadge::Live,
            ConnectionStatus::Connecting => ConnectionBadge::Connecting,
            ConnectionStatus::Disconnected => ConnectionBadge::Offline,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionBadge::Live => "Live",
            ConnectionBadge::Connecting => "Connecting",
            ConnectionBadge::Offline => "Offline",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

/// Search and filter state of the notifications page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilter {
    /// Case-insensitive match against title, message and related user
    pub query: String,
    pub kind: Option<NotificationType>,
    pub read_state: ReadFilter,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &NotificationRecord) -> bool {
        if let Some(kind) = &self.kind {
            if &notification.kind != kind {
                return false;
            }
        }

        let read_ok = match self.read_state {
            ReadFilter::All => true,
            ReadFilter::Unread => !notification.is_read,
            ReadFilter::Read => notification.is_read,
        };
        if !read_ok {
            return false;
        }

        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        notification.title.to_lowercase().contains(&query)
            || notification.message.to_lowercase().contains(&query)
            || notification
                .related_user
                .as_ref()
                .is_some_and(|user| user.name.to_lowercase().contains(&query))
    }

    /// Matching notifications, order preserved
    pub fn apply(&self, notifications: &[NotificationRecord]) -> Vec<NotificationRecord> {
        notifications
            .iter()
            .filter(|n| self.matches(n))
            .cloned()
            .collect()
    }
}

/// Short relative label for a notification timestamp
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);

    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        created_at.format("%b %d, %Y").to_string()
    }
}

/// Mark `ids` read once they have been on screen for `delay`.
///
/// Abort the returned handle if the items leave the screen first.
pub fn schedule_mark_read(
    channel: &NotificationChannel,
    ids: Vec<String>,
    delay: Duration,
) -> JoinHandle<()> {
    let channel = channel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        debug!(count = ids.len(), "Marking visible notifications read");
        for id in ids {
            channel.mark_as_read(id);
        }
    })
}
