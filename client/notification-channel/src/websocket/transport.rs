/// Transport seam for the push connection
///
/// The channel driver only sees a typed sink of [`ClientEvent`]s and a typed
/// stream of [`ServerEvent`]s. [`WsConnector`] provides them over a real
/// WebSocket; tests plug in channel-backed connectors instead.
use super::messages::{ClientEvent, ServerEvent};
use crate::error::{ChannelError, Result};
use async_trait::async_trait;
use futures_util::sink::Sink;
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::connect_async;
use tracing::{debug, trace};

/// Outbound half of a live connection
pub type EventSink = Pin<Box<dyn Sink<ClientEvent, Error = ChannelError> + Send>>;

/// Inbound half of a live connection; ends when the connection does
pub type EventStream = BoxStream<'static, Result<ServerEvent>>;

pub struct Connection {
    pub sink: EventSink,
    pub stream: EventStream,
}

impl Connection {
    pub fn new(sink: EventSink, stream: EventStream) -> Self {
        Self { sink, stream }
    }
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open one authenticated connection.
    ///
    /// A refused credential must surface as [`ChannelError::AuthRejected`] so
    /// the channel does not retry it.
    async fn connect(&self, endpoint_url: &str, token: &str) -> Result<Connection>;
}

/// WebSocket connector sending the credential as a bearer token
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint_url: &str, token: &str) -> Result<Connection> {
        let mut request = endpoint_url.into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ChannelError::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (ws_stream, response) = connect_async(request).await?;
        debug!(status = %response.status(), "WebSocket handshake completed");

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(ChannelError::from)
            .with(|event: ClientEvent| async move {
                event.to_json().map(Message::text).map_err(ChannelError::from)
            });

        let stream = read.filter_map(|frame| async move { decode_frame(frame) });

        Ok(Connection::new(Box::pin(sink), stream.boxed()))
    }
}

/// Turn a raw frame into an inbound event; control frames yield nothing
fn decode_frame(
    frame: std::result::Result<Message, tungstenite::Error>,
) -> Option<Result<ServerEvent>> {
    match frame {
        Ok(Message::Text(text)) => {
            trace!(payload = %text.as_str(), "Inbound frame");
            Some(ServerEvent::from_json(text.as_str()).map_err(ChannelError::from))
        }
        Ok(Message::Close(frame)) => {
            debug!(?frame, "Server closed the push connection");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(e.into())),
    }
}
