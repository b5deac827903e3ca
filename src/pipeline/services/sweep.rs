//! Reminder sweep over pending follow-up tasks.
//!
//! Each pass escalates leads whose linked task is overdue and sends
//! "overdue" and "due soon" reminders to the task's seller. Passes run on a
//! polling interval and whenever a [`SweepTrigger`] is nudged. Reminder
//! delivery is deduplicated by a [`ReminderLedger`] that lives as long as
//! the service.

use crate::pipeline::{
    domain::{
        Comment, CommentBody, DueState, FollowUpTask, FollowUpTaskId, LeadId,
        PipelineDomainError, ReminderKind, ReminderLedger, StageId, StageRules, StageRulesError,
    },
    ports::{
        CommentRepository, FollowUpTaskRepository, LeadRepository, Notification,
        NotificationError, NotificationSink, PipelineRepositoryError,
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DUE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Stages and timing the sweep runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSettings {
    eligible: BTreeSet<StageId>,
    escalation_stage: StageId,
    lookahead: TimeDelta,
}

/// Errors raised when deriving [`SweepSettings`] from stage rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SweepSettingsError {
    /// No escalation stage is configured.
    #[error("an escalation stage must be configured to run the reminder sweep")]
    MissingEscalationStage,
    /// The rules are inconsistent.
    #[error(transparent)]
    Rules(#[from] StageRulesError),
    /// The lookahead window is negative.
    #[error("near-due lookahead must not be negative")]
    NegativeLookahead,
}

impl SweepSettings {
    /// Derives sweep settings from the stage rules.
    ///
    /// # Errors
    ///
    /// Returns [`SweepSettingsError::MissingEscalationStage`] when the rules
    /// name no escalation stage, [`SweepSettingsError::Rules`] when the
    /// escalation stage is itself a trigger stage, and
    /// [`SweepSettingsError::NegativeLookahead`] for a negative window.
    pub fn from_rules(
        rules: &StageRules,
        lookahead: TimeDelta,
    ) -> Result<Self, SweepSettingsError> {
        rules.validate()?;
        let escalation_stage = rules
            .escalation_stage
            .ok_or(SweepSettingsError::MissingEscalationStage)?;
        if lookahead < TimeDelta::zero() {
            return Err(SweepSettingsError::NegativeLookahead);
        }
        Ok(Self {
            eligible: rules.escalation_trigger_stages.clone(),
            escalation_stage,
            lookahead,
        })
    }

    /// Returns the stages whose leads are escalated.
    #[must_use]
    pub const fn eligible(&self) -> &BTreeSet<StageId> {
        &self.eligible
    }

    /// Returns the stage overdue leads move into.
    #[must_use]
    pub const fn escalation_stage(&self) -> StageId {
        self.escalation_stage
    }

    /// Returns the near-due window.
    #[must_use]
    pub const fn lookahead(&self) -> TimeDelta {
        self.lookahead
    }
}

/// A step of a sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepStep {
    /// Querying pending tasks.
    LoadTasks,
    /// Conditionally moving a lead into the escalation stage.
    Escalate,
    /// Writing the system comment for an escalation.
    SystemComment,
    /// Delivering a per-task reminder.
    Notify(ReminderKind),
    /// Delivering the "N leads escalated" notice.
    AggregateNotice,
}

impl fmt::Display for SweepStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadTasks => f.write_str("load_tasks"),
            Self::Escalate => f.write_str("escalate"),
            Self::SystemComment => f.write_str("system_comment"),
            Self::Notify(kind) => write!(f, "notify_{}", kind.as_str()),
            Self::AggregateNotice => f.write_str("aggregate_notice"),
        }
    }
}

/// Cause of a failed sweep step.
#[derive(Debug, Clone, Error)]
pub enum SweepFailure {
    /// A repository call failed.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
    /// The notification sink rejected a message.
    #[error(transparent)]
    Notification(#[from] NotificationError),
    /// A generated value failed domain validation.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
}

/// A sweep step that failed; the pass carried on with the next step.
#[derive(Debug, Clone, Error)]
#[error("sweep step {step} failed: {source}")]
pub struct SweepStepFailed {
    /// Task being processed, when the step concerned one.
    pub task_id: Option<FollowUpTaskId>,
    /// Step that failed.
    pub step: SweepStep,
    /// Underlying failure.
    pub source: SweepFailure,
}

/// Summary of one sweep pass.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Leads moved into the escalation stage.
    pub escalated: Vec<LeadId>,
    /// Reminders and notices delivered.
    pub notifications_sent: usize,
    /// Steps that failed.
    pub failures: Vec<SweepStepFailed>,
}

impl SweepReport {
    /// Returns `true` when every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(
        &mut self,
        task_id: Option<FollowUpTaskId>,
        step: SweepStep,
        source: SweepFailure,
    ) {
        warn!(
            task_id = ?task_id,
            step = %step,
            error = %source,
            "reminder sweep step failed"
        );
        self.failures.push(SweepStepFailed {
            task_id,
            step,
            source,
        });
    }
}

/// Push nudge that wakes the sweep loop for an immediate pass.
///
/// Nudges arriving while a pass runs are coalesced into one follow-up pass.
#[derive(Debug, Clone, Default)]
pub struct SweepTrigger {
    notify: Arc<Notify>,
}

impl SweepTrigger {
    /// Creates a trigger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an immediate pass.
    pub fn nudge(&self) {
        self.notify.notify_one();
    }

    async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Reminder sweep service.
pub struct ReminderSweepService<L, M, T, N, C>
where
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    leads: Arc<L>,
    comments: Arc<M>,
    tasks: Arc<T>,
    sink: Arc<N>,
    clock: Arc<C>,
    settings: SweepSettings,
    ledger: ReminderLedger,
}

impl<L, M, T, N, C> ReminderSweepService<L, M, T, N, C>
where
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a sweep service with an empty reminder ledger.
    #[must_use]
    pub fn new(
        leads: Arc<L>,
        comments: Arc<M>,
        tasks: Arc<T>,
        sink: Arc<N>,
        clock: Arc<C>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            leads,
            comments,
            tasks,
            sink,
            clock,
            settings,
            ledger: ReminderLedger::new(),
        }
    }

    /// Returns the reminder ledger for this session.
    #[must_use]
    pub const fn ledger(&self) -> &ReminderLedger {
        &self.ledger
    }

    /// Runs one sweep pass. Step failures are collected in the report and
    /// never abort the pass.
    pub async fn run_pass(&mut self) -> SweepReport {
        let now = self.clock.utc();
        let cutoff = now
            .checked_add_signed(self.settings.lookahead)
            .unwrap_or(now);
        let mut report = SweepReport::default();
        debug!(cutoff = %cutoff, "starting reminder sweep pass");

        let tasks = match self.tasks.list_pending_due_by(cutoff).await {
            Ok(tasks) => tasks,
            Err(source) => {
                report.record_failure(None, SweepStep::LoadTasks, source.into());
                return report;
            }
        };

        for task in &tasks {
            match task.due_state(now, self.settings.lookahead) {
                DueState::Overdue => {
                    self.escalate(task, now, &mut report).await;
                    self.remind(task, ReminderKind::Overdue, &mut report).await;
                }
                DueState::DueSoon => {
                    self.remind(task, ReminderKind::DueSoon, &mut report).await;
                }
                DueState::NotDue => {}
            }
        }

        if !report.escalated.is_empty() {
            self.send_escalation_notice(&mut report).await;
        }

        info!(
            tasks = tasks.len(),
            escalated = report.escalated.len(),
            notifications = report.notifications_sent,
            failures = report.failures.len(),
            "reminder sweep pass finished"
        );
        report
    }

    /// Runs passes on every `poll_interval` tick and on every trigger
    /// nudge until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Intervals shorter than one second are raised to one second.
    pub async fn run(
        &mut self,
        poll_interval: Duration,
        trigger: &SweepTrigger,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(poll_interval = ?period, "reminder sweep started");

        loop {
            tokio::select! {
                _ = ticker.tick() => debug!("reminder sweep poll tick"),
                () = trigger.notified() => debug!("reminder sweep nudged"),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            self.run_pass().await;
        }

        info!("reminder sweep stopped");
    }

    async fn escalate(&self, task: &FollowUpTask, now: DateTime<Utc>, report: &mut SweepReport) {
        let Some(lead_id) = task.lead_id() else {
            return;
        };
        let escalated = self
            .leads
            .escalate_if_in_stages(
                lead_id,
                &self.settings.eligible,
                self.settings.escalation_stage,
                now,
            )
            .await;

        match escalated {
            Ok(Some(_)) => {
                info!(
                    lead_id = %lead_id,
                    task_id = %task.id(),
                    to_stage = %self.settings.escalation_stage,
                    "lead escalated for overdue follow-up"
                );
                report.escalated.push(lead_id);
                self.write_escalation_comment(task, lead_id, report).await;
            }
            Ok(None) => debug!(
                lead_id = %lead_id,
                task_id = %task.id(),
                "lead not in an escalation trigger stage"
            ),
            Err(source) => {
                report.record_failure(Some(task.id()), SweepStep::Escalate, source.into());
            }
        }
    }

    async fn write_escalation_comment(
        &self,
        task: &FollowUpTask,
        lead_id: LeadId,
        report: &mut SweepReport,
    ) {
        let body = match CommentBody::new(format!(
            "Moved to escalation: follow-up \"{}\" was due {} and is still pending.",
            task.title().as_str(),
            task.due_at().format(DUE_FORMAT)
        )) {
            Ok(body) => body,
            Err(source) => {
                report.record_failure(Some(task.id()), SweepStep::SystemComment, source.into());
                return;
            }
        };
        let comment = Comment::system(lead_id, task.seller_id(), body, &*self.clock);
        if let Err(source) = self.comments.store(&comment).await {
            report.record_failure(Some(task.id()), SweepStep::SystemComment, source.into());
        }
    }

    async fn remind(&mut self, task: &FollowUpTask, kind: ReminderKind, report: &mut SweepReport) {
        if !self.ledger.claim(kind, task.id()) {
            return;
        }
        match self.sink.notify(reminder_for(task, kind)).await {
            Ok(()) => {
                report.notifications_sent += 1;
                debug!(task_id = %task.id(), kind = kind.as_str(), "reminder delivered");
            }
            Err(source) => {
                self.ledger.release(kind, task.id());
                report.record_failure(Some(task.id()), SweepStep::Notify(kind), source.into());
            }
        }
    }

    async fn send_escalation_notice(&self, report: &mut SweepReport) {
        let count = report.escalated.len();
        let notice = Notification::new("Leads escalated", format!("{count} leads escalated"));
        match self.sink.notify(notice).await {
            Ok(()) => report.notifications_sent += 1,
            Err(source) => report.record_failure(None, SweepStep::AggregateNotice, source.into()),
        }
    }
}

fn reminder_for(task: &FollowUpTask, kind: ReminderKind) -> Notification {
    let due = task.due_at().format(DUE_FORMAT);
    let (title, body) = match kind {
        ReminderKind::Overdue => (
            "Follow-up overdue",
            format!("\"{}\" was due {due}", task.title().as_str()),
        ),
        ReminderKind::DueSoon => (
            "Follow-up due soon",
            format!("\"{}\" is due {due}", task.title().as_str()),
        ),
    };
    Notification::new(title, body)
        .for_recipient(task.seller_id())
        .about_lead(task.lead_id())
}
