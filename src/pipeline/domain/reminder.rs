//! In-memory record of reminders already delivered during a sweep session.

use super::FollowUpTaskId;
use std::collections::HashSet;

/// Kind of reminder delivered for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    /// The task is due within the lookahead window.
    DueSoon,
    /// The task's due time has passed.
    Overdue,
}

impl ReminderKind {
    /// Returns a lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
        }
    }
}

/// Tracks which tasks have been notified for each reminder kind.
///
/// Lives for one polling session and is never persisted. A claim reserves
/// the slot before delivery; a failed delivery releases it so a later pass
/// can retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderLedger {
    due_soon: HashSet<FollowUpTaskId>,
    overdue: HashSet<FollowUpTaskId>,
}

impl ReminderLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the reminder; returns `false` if it was already claimed.
    pub fn claim(&mut self, kind: ReminderKind, task_id: FollowUpTaskId) -> bool {
        self.set_mut(kind).insert(task_id)
    }

    /// Releases a claim after a failed delivery.
    pub fn release(&mut self, kind: ReminderKind, task_id: FollowUpTaskId) {
        self.set_mut(kind).remove(&task_id);
    }

    /// Returns `true` when the reminder has been claimed.
    #[must_use]
    pub fn is_claimed(&self, kind: ReminderKind, task_id: FollowUpTaskId) -> bool {
        match kind {
            ReminderKind::DueSoon => self.due_soon.contains(&task_id),
            ReminderKind::Overdue => self.overdue.contains(&task_id),
        }
    }

    fn set_mut(&mut self, kind: ReminderKind) -> &mut HashSet<FollowUpTaskId> {
        match kind {
            ReminderKind::DueSoon => &mut self.due_soon,
            ReminderKind::Overdue => &mut self.overdue,
        }
    }
}
