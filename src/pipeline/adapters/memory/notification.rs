//! Notification sink that records messages in memory.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::pipeline::ports::{
    Notification, NotificationError, NotificationResult, NotificationSink,
};

/// Collects delivered notifications for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every notification delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, notification: Notification) -> NotificationResult<()> {
        let mut delivered = self.delivered.lock().map_err(|err| {
            NotificationError::delivery(std::io::Error::other(err.to_string()))
        })?;
        delivered.push(notification);
        Ok(())
    }
}
