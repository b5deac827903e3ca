//! Service layer for stage changes routed through the transition gate.
//!
//! Exempt targets commit straight away. Gated targets hand back an
//! [`AnnotationWorkflow`]; submitting it persists the comment, the optional
//! follow-up task, and finally the stage change, in that order. A failed
//! write returns the workflow to `Open`. Writes that already succeeded are
//! remembered by the workflow and are not repeated on retry.

use crate::pipeline::{
    domain::{
        AnnotationSubmitError, AnnotationValidationErrors, AnnotationWorkflow, Comment,
        FollowUpTask, GateDecision, Lead, LeadId, NewFollowUpTask, PipelineDomainError,
        StageCatalog, StageId, StageRules, TransitionGate, UserId,
    },
    ports::{
        CommentRepository, FollowUpTaskRepository, LeadRepository, PipelineRepositoryError,
        StageRepository,
    },
};
use chrono::FixedOffset;
use mockable::Clock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rules and locale the transition service runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSettings {
    rules: StageRules,
    local_offset: FixedOffset,
}

impl TransitionSettings {
    /// Creates settings from stage rules and the local UTC offset used to
    /// interpret follow-up due dates.
    #[must_use]
    pub const fn new(rules: StageRules, local_offset: FixedOffset) -> Self {
        Self {
            rules,
            local_offset,
        }
    }

    /// Returns the stage rules.
    #[must_use]
    pub const fn rules(&self) -> &StageRules {
        &self.rules
    }

    /// Returns the local UTC offset.
    #[must_use]
    pub const fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }
}

/// Request to move a lead into another stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChangeRequest {
    /// Lead to move.
    pub lead_id: LeadId,
    /// Requested stage.
    pub target: StageId,
    /// User making the change.
    pub actor: UserId,
}

/// Result of a stage change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The lead already sits in the requested stage.
    Unchanged(Lead),
    /// The target was exempt and the stage change was persisted.
    Committed(Lead),
    /// The target is gated; fill and submit the workflow to commit.
    AnnotationRequired(Box<AnnotationWorkflow>),
}

/// Records written by a successful annotated transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTransition {
    /// The lead after its stage change.
    pub lead: Lead,
    /// Comment explaining the transition.
    pub comment: Comment,
    /// Follow-up task, when one was requested.
    pub follow_up: Option<FollowUpTask>,
}

/// A write performed while committing an annotated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStep {
    /// Persisting the comment.
    Comment,
    /// Persisting the follow-up task.
    FollowUpTask,
    /// Persisting the lead's new stage.
    StageChange,
}

impl CommitStep {
    /// Returns a lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::FollowUpTask => "follow_up_task",
            Self::StageChange => "stage_change",
        }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-level errors for stage transitions.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The requested stage is not registered.
    #[error("stage {0} does not exist")]
    InvalidStage(StageId),
    /// The lead does not exist.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),
    /// The workflow rejected the operation in its current state.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// The annotation form failed validation; the workflow stays open.
    #[error("annotation is invalid: {0}")]
    ValidationFailed(#[from] AnnotationValidationErrors),
    /// A write failed; later writes were not attempted.
    #[error("annotated transition failed at {step}: {source}")]
    PersistenceFailed {
        /// Write that failed.
        step: CommitStep,
        /// Underlying repository error.
        source: PipelineRepositoryError,
    },
    /// Repository operation failed outside the annotated commit.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
}

impl From<AnnotationSubmitError> for TransitionError {
    fn from(err: AnnotationSubmitError) -> Self {
        match err {
            AnnotationSubmitError::State(state) => Self::Domain(state),
            AnnotationSubmitError::Invalid(errors) => Self::ValidationFailed(errors),
        }
    }
}

/// Result type for transition operations.
pub type TransitionResult<T> = Result<T, TransitionError>;

/// Stage transition orchestration service.
#[derive(Clone)]
pub struct LeadTransitionService<S, L, M, T, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    stages: Arc<S>,
    leads: Arc<L>,
    comments: Arc<M>,
    tasks: Arc<T>,
    clock: Arc<C>,
    settings: TransitionSettings,
}

impl<S, L, M, T, C> LeadTransitionService<S, L, M, T, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new transition service.
    #[must_use]
    pub const fn new(
        stages: Arc<S>,
        leads: Arc<L>,
        comments: Arc<M>,
        tasks: Arc<T>,
        clock: Arc<C>,
        settings: TransitionSettings,
    ) -> Self {
        Self {
            stages,
            leads,
            comments,
            tasks,
            clock,
            settings,
        }
    }

    /// Returns the settings this service runs with.
    #[must_use]
    pub const fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    /// Requests moving a lead into another stage.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::LeadNotFound`] when the lead does not
    /// exist, [`TransitionError::InvalidStage`] when the target is not
    /// registered, and [`TransitionError::Repository`] when persistence
    /// fails.
    pub async fn request_stage_change(
        &self,
        request: StageChangeRequest,
    ) -> TransitionResult<TransitionOutcome> {
        let catalog = StageCatalog::new(self.stages.list_ordered().await?);
        let mut lead = self
            .leads
            .find_by_id(request.lead_id)
            .await?
            .ok_or(TransitionError::LeadNotFound(request.lead_id))?;

        let decision = TransitionGate::new(&catalog, &self.settings.rules)
            .decide(lead.stage_id(), request.target)
            .map_err(|err| match err {
                PipelineDomainError::InvalidStage(stage_id) => {
                    TransitionError::InvalidStage(stage_id)
                }
                other => TransitionError::Domain(other),
            })?;
        debug!(
            lead_id = %request.lead_id,
            from_stage = %lead.stage_id(),
            target = %request.target,
            decision = ?decision,
            "transition gate decided"
        );

        match decision {
            GateDecision::NoOp => Ok(TransitionOutcome::Unchanged(lead)),
            GateDecision::Commit { target } => {
                let from_stage = lead.stage_id();
                lead.move_to_stage(target, &*self.clock);
                self.leads.update(&lead).await?;
                info!(
                    lead_id = %lead.id(),
                    from_stage = %from_stage,
                    to_stage = %target,
                    actor = %request.actor,
                    "lead moved to exempt stage"
                );
                Ok(TransitionOutcome::Committed(lead))
            }
            GateDecision::RequireAnnotation {
                target,
                task_required,
            } => Ok(TransitionOutcome::AnnotationRequired(Box::new(
                AnnotationWorkflow::open(
                    lead.id(),
                    lead.stage_id(),
                    target,
                    task_required,
                    request.actor,
                ),
            ))),
        }
    }

    /// Validates and commits an open annotation workflow.
    ///
    /// On success the workflow is `Committed`. On a failed write it is back
    /// to `Open` so the caller can retry or cancel.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ValidationFailed`] with field errors,
    /// [`TransitionError::Domain`] unless the workflow is open,
    /// [`TransitionError::PersistenceFailed`] naming the failed write, and
    /// [`TransitionError::LeadNotFound`] or [`TransitionError::InvalidStage`]
    /// when the lead or target disappeared meanwhile.
    pub async fn submit_annotation(
        &self,
        workflow: &mut AnnotationWorkflow,
    ) -> TransitionResult<AnnotatedTransition> {
        let validated = workflow.begin_submit(self.settings.local_offset)?;
        let lead_id = workflow.lead_id();
        let actor = workflow.actor();

        let comment = if let Some(existing) = workflow.progress().comment() {
            existing.clone()
        } else {
            let created = Comment::new(lead_id, actor, validated.comment, &*self.clock);
            if let Err(source) = self.comments.store(&created).await {
                return Err(Self::abort(workflow, CommitStep::Comment, source));
            }
            workflow.record_comment(created.clone());
            created
        };

        let follow_up = match (validated.follow_up, workflow.progress().follow_up()) {
            (_, Some(existing)) => Some(existing.clone()),
            (Some(draft), None) => {
                let task = FollowUpTask::new(
                    NewFollowUpTask {
                        lead_id: Some(lead_id),
                        seller_id: actor,
                        title: draft.title,
                        description: draft.description,
                        due_at: draft.due_at,
                    },
                    &*self.clock,
                );
                if let Err(source) = self.tasks.store(&task).await {
                    return Err(Self::abort(workflow, CommitStep::FollowUpTask, source));
                }
                workflow.record_follow_up(task.clone());
                Some(task)
            }
            (None, None) => None,
        };

        let lead = self.commit_stage(workflow).await?;
        workflow.complete()?;
        info!(
            lead_id = %lead_id,
            from_stage = %workflow.from_stage(),
            to_stage = %workflow.target_stage(),
            actor = %actor,
            follow_up = follow_up.is_some(),
            "annotated transition committed"
        );

        Ok(AnnotatedTransition {
            lead,
            comment,
            follow_up,
        })
    }

    async fn commit_stage(&self, workflow: &mut AnnotationWorkflow) -> TransitionResult<Lead> {
        let lead_id = workflow.lead_id();
        let target = workflow.target_stage();

        let lookup = match self.stages.find_by_id(target).await {
            Ok(stage) => self.leads.find_by_id(lead_id).await.map(|lead| (stage, lead)),
            Err(source) => Err(source),
        };
        let mut lead = match lookup {
            Ok((Some(_), Some(lead))) => lead,
            Ok((None, _)) => {
                workflow.fail_submit()?;
                return Err(TransitionError::InvalidStage(target));
            }
            Ok((Some(_), None)) => {
                workflow.fail_submit()?;
                return Err(TransitionError::LeadNotFound(lead_id));
            }
            Err(source) => return Err(Self::abort(workflow, CommitStep::StageChange, source)),
        };

        lead.move_to_stage(target, &*self.clock);
        if let Err(source) = self.leads.update(&lead).await {
            return Err(Self::abort(workflow, CommitStep::StageChange, source));
        }
        Ok(lead)
    }

    fn abort(
        workflow: &mut AnnotationWorkflow,
        step: CommitStep,
        source: PipelineRepositoryError,
    ) -> TransitionError {
        warn!(
            lead_id = %workflow.lead_id(),
            step = step.as_str(),
            error = %source,
            "annotated transition write failed"
        );
        if let Err(state) = workflow.fail_submit() {
            return TransitionError::Domain(state);
        }
        TransitionError::PersistenceFailed { step, source }
    }
}
