use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification type tag as sent by the server.
///
/// Unknown tags are kept verbatim so they round-trip and still render with
/// the default icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    /// Someone sent the user a friend request
    FriendRequest,
    /// A friend request the user sent was accepted or declined
    FriendRequestResponse,
    /// A gift on one of the user's wishlists was pledged
    GiftReceived,
    /// A wishlist crossed its pledged-percentage threshold
    WishlistThreshold,
    /// Housekeeping messages; cached but never toasted
    System,
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::FriendRequest => "friend_request",
            NotificationType::FriendRequestResponse => "friend_request_response",
            NotificationType::GiftReceived => "gift_received",
            NotificationType::WishlistThreshold => "wishlist_threshold",
            NotificationType::System => "system",
            NotificationType::Other(tag) => tag,
        }
    }

    /// Whether a push of this type raises a toast
    pub fn is_silent(&self) -> bool {
        matches!(self, NotificationType::System)
    }

    pub fn icon(&self) -> ToastIcon {
        match self {
            NotificationType::FriendRequest | NotificationType::FriendRequestResponse => {
                ToastIcon::People
            }
            NotificationType::GiftReceived => ToastIcon::Gift,
            NotificationType::WishlistThreshold => ToastIcon::Chart,
            NotificationType::System | NotificationType::Other(_) => ToastIcon::Bell,
        }
    }
}

impl From<String> for NotificationType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "friend_request" => NotificationType::FriendRequest,
            "friend_request_response" => NotificationType::FriendRequestResponse,
            "gift_received" => NotificationType::GiftReceived,
            "wishlist_threshold" => NotificationType::WishlistThreshold,
            "system" => NotificationType::System,
            _ => NotificationType::Other(tag),
        }
    }
}

impl From<&str> for NotificationType {
    fn from(tag: &str) -> Self {
        NotificationType::from(tag.to_string())
    }
}

impl From<NotificationType> for String {
    fn from(kind: NotificationType) -> Self {
        match kind {
            NotificationType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedUser {
    pub name: String,
}

/// A single notification as cached on the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub title: String,

    pub message: String,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_user: Option<RelatedUser>,

    /// Back-reference to the event the notification is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_event_id: Option<String>,
}

/// Connection state reported to UI consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastIcon {
    People,
    Gift,
    Chart,
    Bell,
}

impl ToastIcon {
    pub fn glyph(&self) -> &'static str {
        match self {
            ToastIcon::People => "👥",
            ToastIcon::Gift => "🎁",
            ToastIcon::Chart => "📊",
            ToastIcon::Bell => "🔔",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub icon: Option<ToastIcon>,
    pub title: String,
    pub message: String,
}

impl Toast {
    /// Toast for an incoming push, `None` for silent types
    pub fn for_notification(record: &NotificationRecord) -> Option<Self> {
        if record.kind.is_silent() {
            return None;
        }
        Some(Toast {
            level: ToastLevel::Info,
            icon: Some(record.kind.icon()),
            title: record.title.clone(),
            message: record.message.clone(),
        })
    }

    pub fn session_expired() -> Self {
        Toast {
            level: ToastLevel::Error,
            icon: None,
            title: "Session expired".to_string(),
            message: "Your session has expired. Please log in again.".to_string(),
        }
    }

    pub fn connection_lost() -> Self {
        Toast {
            level: ToastLevel::Error,
            icon: None,
            title: "Connection lost".to_string(),
            message: "Lost connection to notifications. Please refresh the page.".to_string(),
        }
    }
}
