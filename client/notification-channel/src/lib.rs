pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod views;
pub mod websocket;

pub use cache::NotificationCache;
pub use channel::{NotificationChannel, Subscription};
pub use config::Config;
pub use error::{ChannelError, Result};
pub use models::{ConnectionStatus, NotificationRecord, NotificationType, RelatedUser};
pub use websocket::{ClientEvent, Connector, ServerEvent, WsConnector};
