//! Repository ports for stages, leads, comments, and follow-up tasks.

use crate::pipeline::domain::{
    Comment, DisplayOrder, FollowUpTask, FollowUpTaskId, Lead, LeadId, Stage, StageId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for pipeline repository operations.
pub type PipelineRepositoryResult<T> = Result<T, PipelineRepositoryError>;

/// Stage registry persistence contract.
#[async_trait]
pub trait StageRepository: Send + Sync {
    /// Stores a new stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::DuplicateStage`] when the id exists.
    async fn store(&self, stage: &Stage) -> PipelineRepositoryResult<()>;

    /// Persists name, color, category, and display order of a stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::StageNotFound`] when missing.
    async fn update(&self, stage: &Stage) -> PipelineRepositoryResult<()>;

    /// Stores new display orders for the listed stages in one atomic write.
    /// Either every position is stored or none is.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::StageNotFound`] when a listed stage
    /// is missing.
    async fn reorder(&self, positions: &[(StageId, DisplayOrder)]) -> PipelineRepositoryResult<()>;

    /// Deletes a stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::StageNotFound`] when missing.
    async fn delete(&self, id: StageId) -> PipelineRepositoryResult<()>;

    /// Finds a stage by identifier.
    async fn find_by_id(&self, id: StageId) -> PipelineRepositoryResult<Option<Stage>>;

    /// Returns all stages ordered by display order.
    async fn list_ordered(&self) -> PipelineRepositoryResult<Vec<Stage>>;
}

/// Lead persistence contract.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Stores a new lead.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::DuplicateLead`] when the id exists.
    async fn store(&self, lead: &Lead) -> PipelineRepositoryResult<()>;

    /// Persists every mutable lead field. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::LeadNotFound`] when missing.
    async fn update(&self, lead: &Lead) -> PipelineRepositoryResult<()>;

    /// Finds a lead by identifier.
    async fn find_by_id(&self, id: LeadId) -> PipelineRepositoryResult<Option<Lead>>;

    /// Returns every lead.
    async fn list_all(&self) -> PipelineRepositoryResult<Vec<Lead>>;

    /// Returns leads currently in `stage_id`.
    async fn list_by_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<Vec<Lead>>;

    /// Returns leads owned by `seller_id`.
    async fn list_by_seller(&self, seller_id: UserId) -> PipelineRepositoryResult<Vec<Lead>>;

    /// Counts leads currently in `stage_id`.
    async fn count_in_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<u64>;

    /// Moves the lead to `target` only if it currently sits in one of
    /// `eligible`, as a single conditional write.
    ///
    /// Returns the updated lead, or `None` when the lead is missing or no
    /// longer in an eligible stage.
    async fn escalate_if_in_stages(
        &self,
        id: LeadId,
        eligible: &BTreeSet<StageId>,
        target: StageId,
        at: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Option<Lead>>;
}

/// Comment persistence contract. Comments are append-only.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores a new comment.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::DuplicateComment`] when the id
    /// exists.
    async fn store(&self, comment: &Comment) -> PipelineRepositoryResult<()>;

    /// Returns a lead's comments, newest first.
    async fn list_for_lead(&self, lead_id: LeadId) -> PipelineRepositoryResult<Vec<Comment>>;
}

/// Follow-up task persistence contract.
#[async_trait]
pub trait FollowUpTaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::DuplicateFollowUpTask`] when the id
    /// exists.
    async fn store(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()>;

    /// Persists the task status.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::FollowUpTaskNotFound`] when
    /// missing.
    async fn update(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(
        &self,
        id: FollowUpTaskId,
    ) -> PipelineRepositoryResult<Option<FollowUpTask>>;

    /// Returns a seller's tasks ordered by due time.
    async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>>;

    /// Returns pending tasks due at or before `cutoff`, ordered by due time.
    async fn list_pending_due_by(
        &self,
        cutoff: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>>;
}

/// Errors returned by pipeline repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PipelineRepositoryError {
    /// A stage with the same identifier already exists.
    #[error("duplicate stage identifier: {0}")]
    DuplicateStage(StageId),

    /// A lead with the same identifier already exists.
    #[error("duplicate lead identifier: {0}")]
    DuplicateLead(LeadId),

    /// A comment with the same identifier already exists.
    #[error("duplicate comment identifier: {0}")]
    DuplicateComment(crate::pipeline::domain::CommentId),

    /// A follow-up task with the same identifier already exists.
    #[error("duplicate follow-up task identifier: {0}")]
    DuplicateFollowUpTask(FollowUpTaskId),

    /// The stage was not found.
    #[error("stage not found: {0}")]
    StageNotFound(StageId),

    /// The lead was not found.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),

    /// The follow-up task was not found.
    #[error("follow-up task not found: {0}")]
    FollowUpTaskNotFound(FollowUpTaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PipelineRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
