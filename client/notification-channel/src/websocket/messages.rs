/// Push-channel event types
///
/// Every frame is a JSON text message shaped as
/// `{"event": "<name>", "data": <payload>}`.
use crate::models::NotificationRecord;
use serde::{Deserialize, Serialize};

/// Error codes the server uses when it refuses the credential
const AUTH_ERROR_CODES: &[&str] = &["UNAUTHORIZED", "AUTH_FAILED", "TOKEN_EXPIRED", "INVALID_TOKEN"];

/// Events sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Ask for the full notification list of the authenticated user
    GetNotifications,

    /// Ask the server to persist the read state of one notification
    MarkNotificationRead(String),
}

/// Events pushed from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full snapshot, newest first
    NotificationsList(Vec<NotificationRecord>),

    /// Incremental push of a single notification
    NewNotification(NotificationRecord),

    /// Read-state confirmation
    NotificationMarkedRead {
        #[serde(rename = "notificationId")]
        notification_id: String,
    },

    /// Transport or auth failure reported by the server
    #[serde(alias = "connect_error")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default)]
        message: String,
    },
}

impl ClientEvent {
    pub fn mark_read(id: impl Into<String>) -> Self {
        ClientEvent::MarkNotificationRead(id.into())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerEvent {
    /// Create an error event
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Whether this event means the credential was refused
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            ServerEvent::Error { code, message } => {
                let code_matches = code.as_deref().is_some_and(|code| {
                    AUTH_ERROR_CODES
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(code))
                });
                code_matches || message.to_ascii_lowercase().contains("authentication")
            }
            _ => false,
        }
    }
}
