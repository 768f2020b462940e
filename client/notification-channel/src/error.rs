use resilience::TimeoutError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

pub type Result<T> = std::result::Result<T, ChannelError>;

/// Failures observed on the push connection.
///
/// These never reach callers of [`crate::NotificationChannel`]; the driver
/// turns them into connection status changes and toasts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("undecodable frame: {0}")]
    Decode(String),

    #[error("handshake timed out: {0}")]
    Timeout(String),

    #[error("invalid connection request: {0}")]
    InvalidRequest(String),

    /// The session's command queue was dropped by a local teardown
    #[error("command channel closed")]
    ChannelClosed,
}

impl ChannelError {
    /// Whether the reconnection procedure should run for this error.
    ///
    /// Auth rejections end the session, malformed requests will fail the
    /// same way on every attempt, and a closed command queue means the
    /// session is already gone.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Transport(_) | ChannelError::Timeout(_) => true,
            ChannelError::AuthRejected(_)
            | ChannelError::Decode(_)
            | ChannelError::InvalidRequest(_)
            | ChannelError::ChannelClosed => false,
        }
    }
}

impl From<tungstenite::Error> for ChannelError {
    fn from(e: tungstenite::Error) -> Self {
        match &e {
            tungstenite::Error::Http(response)
                if response.status() == 401 || response.status() == 403 =>
            {
                ChannelError::AuthRejected(format!("handshake returned {}", response.status()))
            }
            tungstenite::Error::Url(_) | tungstenite::Error::HttpFormat(_) => {
                ChannelError::InvalidRequest(e.to_string())
            }
            _ => ChannelError::Transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(e: serde_json::Error) -> Self {
        ChannelError::Decode(e.to_string())
    }
}

impl From<TimeoutError> for ChannelError {
    fn from(e: TimeoutError) -> Self {
        ChannelError::Timeout(e.to_string())
    }
}
