/// Resilience patterns for client connections
///
/// This library provides the retry and timeout building blocks used by
/// long-lived client connections:
/// - **Retry**: Exponential backoff with optional jitter and an attempt budget
/// - **Timeout**: Enforces time limits on connection handshakes
/// - **Preset Configurations**: Pre-tuned settings for WebSocket push channels
///
/// # Example: Reconnect loop with a bounded budget
///
/// ```rust,no_run
/// use resilience::{presets, RetryState};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::websocket_config();
///     let mut state = RetryState::new(config.retry.unwrap_or_default());
///
///     while let Ok(delay) = state.next_delay() {
///         tokio::time::sleep(delay).await;
///         // Try to reconnect here, call `state.reset()` on success
///     }
/// }
/// ```

pub mod presets;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use presets::{websocket_config, ServiceConfig};
pub use retry::{RetryConfig, RetryError, RetryState};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
