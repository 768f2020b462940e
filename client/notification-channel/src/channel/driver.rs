use super::{Flow, Shared};
use crate::error::{ChannelError, Result};
use crate::websocket::{ClientEvent, Connection, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use resilience::with_timeout;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Connection driver for one session.
///
/// Loops connect -> dispatch -> backoff until the session is torn down, the
/// server rejects the credential, or the retry budget runs out.
pub(crate) async fn run(shared: Arc<Shared>, session: u64, token: String, endpoint_url: String) {
    loop {
        if !shared.begin_attempt(session) {
            return;
        }

        let outcome = match with_timeout(
            shared.config.connect_timeout,
            shared.connector.connect(&endpoint_url, &token),
        )
        .await
        {
            Ok(Ok(connection)) => serve(&shared, session, connection).await,
            Ok(Err(e)) => Err(e),
            Err(elapsed) => Err(elapsed.into()),
        };

        match outcome {
            Ok(()) | Err(ChannelError::ChannelClosed) => return,
            Err(ChannelError::AuthRejected(reason)) => {
                shared.reject_session(session, &reason);
                return;
            }
            Err(e) if !e.is_retryable() => {
                shared.give_up(session, &e);
                return;
            }
            Err(e) => {
                warn!(error = %e, "Notification channel connection lost");
            }
        }

        let Some(delay) = shared.schedule_reconnect(session) else {
            return;
        };
        tokio::time::sleep(delay).await;
    }
}

/// Run one live connection until it ends.
///
/// `Ok(())` or [`ChannelError::ChannelClosed`] means the session ended
/// locally; any other error is handed back to the reconnect logic.
async fn serve(shared: &Shared, session: u64, connection: Connection) -> Result<()> {
    let Connection {
        mut sink,
        mut stream,
    } = connection;
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    if !shared.on_connected(session, outbound_tx) {
        return Ok(());
    }
    info!(session, "Notification channel connected");

    sink.send(ClientEvent::GetNotifications).await?;

    loop {
        tokio::select! {
            command = outbound_rx.recv() => match command {
                Some(event) => {
                    debug!(?event, "Sending notification command");
                    sink.send(event).await?;
                }
                None => return Err(ChannelError::ChannelClosed),
            },
            inbound = stream.next() => match inbound {
                Some(Ok(event)) => {
                    if dispatch(shared, session, event)? == Flow::Stale {
                        return Ok(());
                    }
                }
                Some(Err(ChannelError::Decode(reason))) => {
                    warn!(%reason, "Skipping undecodable notification frame");
                }
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(ChannelError::Transport(
                        "server closed the connection".to_string(),
                    ))
                }
            },
        }
    }
}

/// Apply one inbound event to the session state
fn dispatch(shared: &Shared, session: u64, event: ServerEvent) -> Result<Flow> {
    if event.is_auth_rejection() {
        let reason = match event {
            ServerEvent::Error { message, .. } => message,
            _ => String::new(),
        };
        return Err(ChannelError::AuthRejected(reason));
    }

    let flow = match event {
        ServerEvent::NotificationsList(records) => shared.replace_all(session, records),
        ServerEvent::NewNotification(record) => shared.push(session, record),
        ServerEvent::NotificationMarkedRead { notification_id } => {
            shared.confirm_read(session, &notification_id)
        }
        ServerEvent::Error { code, message } => {
            return Err(ChannelError::Transport(format!(
                "server error {}: {}",
                code.as_deref().unwrap_or("UNKNOWN"),
                message
            )));
        }
    };

    Ok(flow)
}
