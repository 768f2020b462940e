/// Deadline for a single connection handshake
use std::future::Future;
use std::time::Duration;

/// How long a handshake may take unless configured otherwise
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("handshake did not complete within {0:?}")]
    Elapsed(Duration),
}

/// Race `future` against `limit`.
///
/// A fallible future comes back as `Ok(Err(..))`, so its own error stays
/// distinguishable from the deadline firing.
pub async fn with_timeout<F, T>(limit: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(output) => Ok(output),
        Err(_) => Err(TimeoutError::Elapsed(limit)),
    }
}
