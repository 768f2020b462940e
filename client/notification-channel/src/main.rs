use anyhow::Context;
use chrono::Utc;
use notification_channel::{
    logging,
    views::{relative_time, schedule_mark_read, BellSummary, ConnectionBadge},
    Config, NotificationChannel,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().context("invalid notification channel configuration")?;
    let token = config
        .endpoint
        .token
        .clone()
        .context("AUTH_TOKEN must be set to open the notification channel")?;

    tracing::info!(url = %config.endpoint.url, "Starting notification channel client");

    // Composition root: the one channel instance lives until logout/shutdown
    let channel = NotificationChannel::websocket(config.channel.clone());

    let bell_limit = config.ui.bell_recent_limit;
    let mark_read_delay = config.ui.mark_read_delay;
    let bell_channel = channel.clone();
    let subscription = channel.subscribe(move |notifications| {
        let summary = BellSummary::from_notifications(&notifications, bell_limit);
        tracing::info!(
            unread = summary.unread_count,
            badge = summary.badge().unwrap_or_default(),
            "Notifications updated"
        );

        let now = Utc::now();
        for item in &summary.recent {
            tracing::info!(
                id = %item.id,
                kind = %item.kind,
                read = item.is_read,
                when = %relative_time(item.created_at, now),
                "{}",
                item.title
            );
        }

        // The dropdown is "open" in this headless client, so unread items
        // count as seen
        let unread: Vec<String> = summary
            .recent
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect();
        if !unread.is_empty() {
            schedule_mark_read(&bell_channel, unread, mark_read_delay);
        }
    });

    channel.connect(token, config.endpoint.url.clone());

    let mut status_check = tokio::time::interval(config.ui.status_poll_interval);
    loop {
        tokio::select! {
            _ = status_check.tick() => {
                let badge = ConnectionBadge::from_status(channel.connection_status());
                tracing::debug!(badge = badge.label(), "Connection status");
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for shutdown signal")?;
                break;
            }
        }
    }

    tracing::info!("Shutting down notification channel client");
    subscription.unsubscribe();
    channel.disconnect();

    Ok(())
}
