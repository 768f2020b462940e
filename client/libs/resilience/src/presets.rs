/// Preset configurations for client connection types
use crate::retry::RetryConfig;
use crate::timeout::{TimeoutConfig, DEFAULT_HANDSHAKE_TIMEOUT};
use std::time::Duration;

/// Configuration bundle for a connection type
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: Option<RetryConfig>,
}

/// Persistent WebSocket push channels (notifications, live updates)
///
/// - Timeout: 10s per handshake
/// - Retry: 5 reconnect attempts, 1s doubling, no jitter so the
///   schedule is predictable for the user-facing status badge
pub fn websocket_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: DEFAULT_HANDSHAKE_TIMEOUT,
        },
        retry: Some(RetryConfig {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }),
    }
}
