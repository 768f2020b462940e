use resilience::{presets, RetryConfig};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub channel: ChannelConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// WebSocket push endpoint, e.g. `ws://localhost:5000/notifications`
    pub url: String,
    /// Bearer token handed over by the Auth collaborator
    pub token: Option<String>,
}

/// Settings owned by [`crate::NotificationChannel`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub reconnect: RetryConfig,
    /// Upper bound for a single connection handshake
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        let preset = presets::websocket_config();
        Self {
            reconnect: preset.retry.unwrap_or_default(),
            connect_timeout: preset.timeout.duration,
        }
    }
}

/// Presentation-side timings used by the bell and list views
#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    /// Visible time before an unread item is marked read
    pub mark_read_delay: Duration,
    /// How often the connection badge is refreshed
    pub status_poll_interval: Duration,
    /// Items shown in the bell dropdown
    pub bell_recent_limit: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mark_read_delay: Duration::from_millis(2000),
            status_poll_interval: Duration::from_secs(5),
            bell_recent_limit: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let channel_defaults = ChannelConfig::default();
        let ui_defaults = UiConfig::default();

        let reconnect = RetryConfig {
            max_retries: parse_or(
                "RECONNECT_MAX_ATTEMPTS",
                channel_defaults.reconnect.max_retries,
            )?,
            initial_backoff: Duration::from_millis(parse_or(
                "RECONNECT_BASE_DELAY_MS",
                channel_defaults.reconnect.initial_backoff.as_millis() as u64,
            )?),
            ..channel_defaults.reconnect
        };

        Ok(Config {
            endpoint: EndpointConfig {
                url: env::var("NOTIFICATIONS_WS_URL")
                    .map_err(|_| ConfigError::Missing("NOTIFICATIONS_WS_URL"))?,
                token: env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            },
            channel: ChannelConfig {
                reconnect,
                connect_timeout: Duration::from_secs(parse_or(
                    "CONNECT_TIMEOUT_SECS",
                    channel_defaults.connect_timeout.as_secs(),
                )?),
            },
            ui: UiConfig {
                mark_read_delay: Duration::from_millis(parse_or(
                    "MARK_READ_DELAY_MS",
                    ui_defaults.mark_read_delay.as_millis() as u64,
                )?),
                status_poll_interval: Duration::from_secs(parse_or(
                    "STATUS_POLL_INTERVAL_SECS",
                    ui_defaults.status_poll_interval.as_secs(),
                )?),
                bell_recent_limit: parse_or("BELL_RECENT_LIMIT", ui_defaults.bell_recent_limit)?,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
