//! Follow-up tasks owned by sellers, optionally linked to a lead.

use super::{FollowUpTaskId, LeadId, ParseFollowUpStatusError, PipelineDomainError, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty follow-up task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyTaskTitle`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyTaskTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion status of a follow-up task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    /// Not done yet.
    Pending,
    /// Done.
    Completed,
}

impl FollowUpStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FollowUpStatus {
    type Error = ParseFollowUpStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseFollowUpStatusError(value.to_owned())),
        }
    }
}

/// Where a pending task sits relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueState {
    /// Completed, or due later than the lookahead window.
    NotDue,
    /// Due within the lookahead window and not yet past.
    DueSoon,
    /// Due strictly before the reference time.
    Overdue,
}

/// Parameter object for creating a follow-up task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFollowUpTask {
    /// Linked lead, if any.
    pub lead_id: Option<LeadId>,
    /// Owning seller.
    pub seller_id: UserId,
    /// Task title.
    pub title: TaskTitle,
    /// Optional description.
    pub description: Option<String>,
    /// Due timestamp.
    pub due_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted follow-up task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFollowUpTaskData {
    /// Persisted identifier.
    pub id: FollowUpTaskId,
    /// Persisted lead link.
    pub lead_id: Option<LeadId>,
    /// Persisted owning seller.
    pub seller_id: UserId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted due timestamp.
    pub due_at: DateTime<Utc>,
    /// Persisted status.
    pub status: FollowUpStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last status change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A dated reminder for a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpTask {
    id: FollowUpTaskId,
    lead_id: Option<LeadId>,
    seller_id: UserId,
    title: TaskTitle,
    description: Option<String>,
    due_at: DateTime<Utc>,
    status: FollowUpStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FollowUpTask {
    /// Creates a pending follow-up task.
    #[must_use]
    pub fn new(data: NewFollowUpTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: FollowUpTaskId::new(),
            lead_id: data.lead_id,
            seller_id: data.seller_id,
            title: data.title,
            description: data.description.and_then(super::lead::non_blank),
            due_at: data.due_at,
            status: FollowUpStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedFollowUpTaskData) -> Self {
        Self {
            id: data.id,
            lead_id: data.lead_id,
            seller_id: data.seller_id,
            title: data.title,
            description: data.description,
            due_at: data.due_at,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> FollowUpTaskId {
        self.id
    }

    /// Returns the linked lead, if any.
    #[must_use]
    pub const fn lead_id(&self) -> Option<LeadId> {
        self.lead_id
    }

    /// Returns the owning seller.
    #[must_use]
    pub const fn seller_id(&self) -> UserId {
        self.seller_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due timestamp.
    #[must_use]
    pub const fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> FollowUpStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last status change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the status; returns `true` when it changed.
    pub fn set_status(&mut self, status: FollowUpStatus, clock: &impl Clock) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.updated_at = clock.utc();
        true
    }

    /// Classifies the task against `now` and a near-due `lookahead`.
    #[must_use]
    pub fn due_state(&self, now: DateTime<Utc>, lookahead: TimeDelta) -> DueState {
        if self.status != FollowUpStatus::Pending {
            return DueState::NotDue;
        }
        if self.due_at < now {
            return DueState::Overdue;
        }
        match now.checked_add_signed(lookahead) {
            Some(horizon) if self.due_at <= horizon => DueState::DueSoon,
            _ => DueState::NotDue,
        }
    }
}
