//! Annotation workflow for gated stage transitions.
//!
//! A gated transition opens an [`AnnotationWorkflow`]. The caller edits the
//! [`AnnotationForm`], then submits. Submission validates the form and, on
//! success, moves the workflow into `Submitting` while the service persists
//! the comment, the optional follow-up task, and finally the stage change.
//!
//! ```text
//! (none) ──open──▶ Open ──begin_submit──▶ Submitting ──complete──▶ Committed
//!                   │  ▲                      │
//!                   │  └──────fail_submit─────┘
//!                   └──cancel──▶ Cancelled
//! ```
//!
//! Validation failures leave the workflow `Open`. Steps already persisted
//! before a failure are remembered so a retry resumes at the failed step.

use super::{
    Comment, CommentBody, FollowUpTask, LeadId, PipelineDomainError, StageId, TaskTitle, UserId,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use std::fmt;
use thiserror::Error;

/// Due time used when the form does not specify one.
pub const DEFAULT_DUE_TIME: &str = "12:00";

const DUE_TIME_FORMAT: &str = "%H:%M";

/// Editable fields of the annotation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationForm {
    /// Mandatory comment text.
    pub comment: String,
    /// Follow-up task title; required unless the target is task-optional.
    pub task_title: String,
    /// Optional follow-up task description.
    pub task_description: String,
    /// Follow-up task due date in local time.
    pub task_due_date: Option<NaiveDate>,
    /// Follow-up task due time as `HH:MM` in local time.
    pub task_due_time: String,
}

impl Default for AnnotationForm {
    fn default() -> Self {
        Self {
            comment: String::new(),
            task_title: String::new(),
            task_description: String::new(),
            task_due_date: None,
            task_due_time: DEFAULT_DUE_TIME.to_owned(),
        }
    }
}

/// Form field a validation message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationField {
    /// The comment text.
    Comment,
    /// The follow-up task title.
    TaskTitle,
    /// The follow-up task due date.
    TaskDueDate,
    /// The follow-up task due time.
    TaskDueTime,
}

impl AnnotationField {
    /// Returns the form field key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::TaskTitle => "task_title",
            Self::TaskDueDate => "task_due_date",
            Self::TaskDueTime => "task_due_time",
        }
    }
}

impl fmt::Display for AnnotationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Offending field.
    pub field: AnnotationField,
    /// Human-readable message.
    pub message: &'static str,
}

/// All field errors found in one submission attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("annotation form has {} invalid field(s)", .0.len())]
pub struct AnnotationValidationErrors(Vec<FieldError>);

impl AnnotationValidationErrors {
    /// Returns the collected field errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns `true` when `field` has an error.
    #[must_use]
    pub fn has_error_for(&self, field: AnnotationField) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

/// Follow-up task fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpDraft {
    /// Task title.
    pub title: TaskTitle,
    /// Task description, if any.
    pub description: Option<String>,
    /// Combined due date and time, converted to UTC.
    pub due_at: DateTime<Utc>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAnnotation {
    /// Comment to persist.
    pub comment: CommentBody,
    /// Follow-up task to persist, when a title was supplied.
    pub follow_up: Option<FollowUpDraft>,
}

impl AnnotationForm {
    /// Validates the form.
    ///
    /// The comment is always required. When `task_required` is set the task
    /// title and due date are required too. A task title supplied for a
    /// task-optional stage still needs a due date so the task can be saved.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(
        &self,
        task_required: bool,
        local_offset: FixedOffset,
    ) -> Result<ValidatedAnnotation, AnnotationValidationErrors> {
        let mut errors = Vec::new();

        let comment = CommentBody::new(self.comment.as_str()).ok();
        if comment.is_none() {
            errors.push(FieldError {
                field: AnnotationField::Comment,
                message: "comment is required",
            });
        }

        let title = TaskTitle::new(self.task_title.as_str()).ok();
        let wants_task = task_required || title.is_some();
        if task_required && title.is_none() {
            errors.push(FieldError {
                field: AnnotationField::TaskTitle,
                message: "task title is required for this stage",
            });
        }

        let due_at = if wants_task {
            self.due_at(local_offset, &mut errors)
        } else {
            None
        };
        if wants_task && due_at.is_none() && errors.is_empty() {
            errors.push(FieldError {
                field: AnnotationField::TaskDueDate,
                message: "due date does not exist in the local time zone",
            });
        }

        match (comment, title, due_at) {
            (Some(comment), title, due_at) if errors.is_empty() => Ok(ValidatedAnnotation {
                comment,
                follow_up: title.zip(due_at).map(|(title, due_at)| FollowUpDraft {
                    title,
                    description: super::lead::non_blank(self.task_description.clone()),
                    due_at,
                }),
            }),
            _ => Err(AnnotationValidationErrors(errors)),
        }
    }

    fn due_at(
        &self,
        local_offset: FixedOffset,
        errors: &mut Vec<FieldError>,
    ) -> Option<DateTime<Utc>> {
        let trimmed = self.task_due_time.trim();
        let time_input = if trimmed.is_empty() {
            DEFAULT_DUE_TIME
        } else {
            trimmed
        };
        let time = NaiveTime::parse_from_str(time_input, DUE_TIME_FORMAT).ok();
        if time.is_none() {
            errors.push(FieldError {
                field: AnnotationField::TaskDueTime,
                message: "due time must be HH:MM",
            });
        }
        if self.task_due_date.is_none() {
            errors.push(FieldError {
                field: AnnotationField::TaskDueDate,
                message: "due date is required",
            });
        }

        let local = self.task_due_date?.and_time(time?);
        local
            .and_local_timezone(local_offset)
            .single()
            .map(|zoned| zoned.with_timezone(&Utc))
    }
}

/// Lifecycle state of an annotation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// The dialog is open and editable.
    Open,
    /// Submission is running; cancellation is no longer possible.
    Submitting,
    /// All writes succeeded.
    Committed,
    /// The user closed the dialog before submitting.
    Cancelled,
}

impl WorkflowState {
    /// Returns a lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Submitting => "submitting",
            Self::Committed => "committed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Writes already persisted by earlier submission attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionProgress {
    comment: Option<Comment>,
    follow_up: Option<FollowUpTask>,
}

impl SubmissionProgress {
    /// Returns the persisted comment, if that step completed.
    #[must_use]
    pub const fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    /// Returns the persisted follow-up task, if that step completed.
    #[must_use]
    pub const fn follow_up(&self) -> Option<&FollowUpTask> {
        self.follow_up.as_ref()
    }
}

/// Errors returned when a submission cannot begin.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationSubmitError {
    /// The workflow is not open.
    #[error(transparent)]
    State(#[from] PipelineDomainError),
    /// The form failed validation; the workflow stays open.
    #[error(transparent)]
    Invalid(#[from] AnnotationValidationErrors),
}

/// Annotation workflow escorting one gated transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationWorkflow {
    lead_id: LeadId,
    from_stage: StageId,
    target_stage: StageId,
    actor: UserId,
    task_required: bool,
    form: AnnotationForm,
    state: WorkflowState,
    progress: SubmissionProgress,
}

impl AnnotationWorkflow {
    /// Opens a workflow for moving `lead_id` into `target_stage`.
    #[must_use]
    pub fn open(
        lead_id: LeadId,
        from_stage: StageId,
        target_stage: StageId,
        task_required: bool,
        actor: UserId,
    ) -> Self {
        Self {
            lead_id,
            from_stage,
            target_stage,
            actor,
            task_required,
            form: AnnotationForm::default(),
            state: WorkflowState::Open,
            progress: SubmissionProgress::default(),
        }
    }

    /// Returns the lead being moved.
    #[must_use]
    pub const fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    /// Returns the stage the lead was in when the workflow opened.
    #[must_use]
    pub const fn from_stage(&self) -> StageId {
        self.from_stage
    }

    /// Returns the target stage.
    #[must_use]
    pub const fn target_stage(&self) -> StageId {
        self.target_stage
    }

    /// Returns the user the writes are attributed to.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        self.actor
    }

    /// Returns `true` when a follow-up task is mandatory.
    #[must_use]
    pub const fn task_required(&self) -> bool {
        self.task_required
    }

    /// Returns the current workflow state.
    #[must_use]
    pub const fn state(&self) -> WorkflowState {
        self.state
    }

    /// Returns the form contents.
    #[must_use]
    pub const fn form(&self) -> &AnnotationForm {
        &self.form
    }

    /// Returns writes persisted by earlier attempts.
    #[must_use]
    pub const fn progress(&self) -> &SubmissionProgress {
        &self.progress
    }

    /// Returns the form for editing.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::WorkflowState`] unless the workflow is
    /// open.
    pub fn form_mut(&mut self) -> Result<&mut AnnotationForm, PipelineDomainError> {
        self.ensure_state(WorkflowState::Open)?;
        Ok(&mut self.form)
    }

    /// Replaces the form contents.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::WorkflowState`] unless the workflow is
    /// open.
    pub fn fill(&mut self, form: AnnotationForm) -> Result<(), PipelineDomainError> {
        *self.form_mut()? = form;
        Ok(())
    }

    /// Closes the dialog without submitting.
    ///
    /// Writes persisted by an earlier failed attempt are not retracted.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::WorkflowState`] unless the workflow is
    /// open.
    pub fn cancel(&mut self) -> Result<(), PipelineDomainError> {
        self.ensure_state(WorkflowState::Open)?;
        self.state = WorkflowState::Cancelled;
        Ok(())
    }

    /// Validates the form and, on success, enters `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationSubmitError::State`] unless the workflow is open,
    /// and [`AnnotationSubmitError::Invalid`] when validation fails; the
    /// workflow stays open in both cases.
    pub fn begin_submit(
        &mut self,
        local_offset: FixedOffset,
    ) -> Result<ValidatedAnnotation, AnnotationSubmitError> {
        self.ensure_state(WorkflowState::Open)?;
        let validated = self.form.validate(self.task_required, local_offset)?;
        self.state = WorkflowState::Submitting;
        Ok(validated)
    }

    /// Records a persisted comment.
    pub fn record_comment(&mut self, comment: Comment) {
        self.progress.comment = Some(comment);
    }

    /// Records a persisted follow-up task.
    pub fn record_follow_up(&mut self, task: FollowUpTask) {
        self.progress.follow_up = Some(task);
    }

    /// Returns to `Open` after a failed write so the user can retry or
    /// cancel.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::WorkflowState`] unless submitting.
    pub fn fail_submit(&mut self) -> Result<(), PipelineDomainError> {
        self.ensure_state(WorkflowState::Submitting)?;
        self.state = WorkflowState::Open;
        Ok(())
    }

    /// Marks every write as done.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::WorkflowState`] unless submitting.
    pub fn complete(&mut self) -> Result<(), PipelineDomainError> {
        self.ensure_state(WorkflowState::Submitting)?;
        self.state = WorkflowState::Committed;
        Ok(())
    }

    const fn ensure_state(&self, expected: WorkflowState) -> Result<(), PipelineDomainError> {
        if matches!(
            (self.state, expected),
            (WorkflowState::Open, WorkflowState::Open)
                | (WorkflowState::Submitting, WorkflowState::Submitting)
        ) {
            return Ok(());
        }
        Err(PipelineDomainError::WorkflowState {
            state: self.state.as_str(),
            expected: expected.as_str(),
        })
    }
}
