//! Notification sink port.
//!
//! The pipeline only hands notifications over; formatting, delivery, and
//! retries belong to the sink.

use crate::pipeline::domain::{LeadId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// A message for a toast, banner, browser notification, or relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Intended recipient; `None` addresses operators or all viewers.
    pub recipient: Option<UserId>,
    /// Short headline.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Lead the message is about, if any.
    pub lead_id: Option<LeadId>,
}

impl Notification {
    /// Creates a notification with no recipient or lead.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: None,
            title: title.into(),
            body: body.into(),
            lead_id: None,
        }
    }

    /// Addresses the notification to `recipient`.
    #[must_use]
    pub const fn for_recipient(mut self, recipient: UserId) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Links the notification to a lead.
    #[must_use]
    pub const fn about_lead(mut self, lead_id: Option<LeadId>) -> Self {
        self.lead_id = lead_id;
        self
    }
}

/// Result type for notification delivery.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Delivery contract for pipeline notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Hands a notification to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the sink rejects the message.
    async fn notify(&self, notification: Notification) -> NotificationResult<()>;
}

/// Errors returned by notification sinks.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The sink could not accept the message.
    #[error("notification delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationError {
    /// Wraps a delivery error.
    #[must_use]
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
