//! Notification sink that writes to the `tracing` log.

use async_trait::async_trait;
use tracing::info;

use crate::pipeline::ports::{Notification, NotificationResult, NotificationSink};

/// Emits each notification as a structured `info` event.
///
/// Used by the sweep binary when no external relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, notification: Notification) -> NotificationResult<()> {
        let recipient = notification
            .recipient
            .map_or_else(|| "operators".to_owned(), |id| id.to_string());
        let lead_id = notification
            .lead_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        info!(
            recipient = %recipient,
            lead_id = %lead_id,
            title = %notification.title,
            "{}",
            notification.body
        );
        Ok(())
    }
}
