/// WebSocket push channel plumbing
///
/// 1. messages: typed client/server events and their JSON framing
/// 2. transport: the `Connector` seam and its tokio-tungstenite implementation

pub mod messages;
pub mod transport;

pub use messages::{ClientEvent, ServerEvent};
pub use transport::{Connection, Connector, EventSink, EventStream, WsConnector};
