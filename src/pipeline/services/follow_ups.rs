//! Service layer for seller follow-up tasks.

use crate::pipeline::{
    domain::{
        FollowUpStatus, FollowUpTask, FollowUpTaskId, LeadId, NewFollowUpTask,
        PipelineDomainError, TaskTitle, UserId,
    },
    ports::{FollowUpTaskRepository, LeadRepository, PipelineRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Request payload for creating a follow-up task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFollowUpRequest {
    seller_id: UserId,
    title: String,
    due_at: DateTime<Utc>,
    lead_id: Option<LeadId>,
    description: Option<String>,
}

impl CreateFollowUpRequest {
    /// Creates a standalone task request.
    #[must_use]
    pub fn new(seller_id: UserId, title: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        Self {
            seller_id,
            title: title.into(),
            due_at,
            lead_id: None,
            description: None,
        }
    }

    /// Links the task to a lead.
    #[must_use]
    pub const fn for_lead(mut self, lead_id: LeadId) -> Self {
        self.lead_id = Some(lead_id);
        self
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Service-level errors for follow-up task operations.
#[derive(Debug, Error)]
pub enum FollowUpServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// The linked lead does not exist.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),
    /// The task does not exist.
    #[error("follow-up task not found: {0}")]
    TaskNotFound(FollowUpTaskId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
}

/// Result type for follow-up task operations.
pub type FollowUpServiceResult<T> = Result<T, FollowUpServiceError>;

/// Follow-up task service.
#[derive(Clone)]
pub struct FollowUpService<L, T, C>
where
    L: LeadRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    leads: Arc<L>,
    tasks: Arc<T>,
    clock: Arc<C>,
}

impl<L, T, C> FollowUpService<L, T, C>
where
    L: LeadRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new follow-up task service.
    #[must_use]
    pub const fn new(leads: Arc<L>, tasks: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            leads,
            tasks,
            clock,
        }
    }

    /// Creates a pending task, optionally linked to a lead.
    ///
    /// # Errors
    ///
    /// Returns [`FollowUpServiceError::Domain`] for a blank title,
    /// [`FollowUpServiceError::LeadNotFound`] when the linked lead does not
    /// exist, and [`FollowUpServiceError::Repository`] when persistence
    /// fails.
    pub async fn create_task(
        &self,
        request: CreateFollowUpRequest,
    ) -> FollowUpServiceResult<FollowUpTask> {
        let title = TaskTitle::new(request.title)?;
        if let Some(lead_id) = request.lead_id
            && self.leads.find_by_id(lead_id).await?.is_none()
        {
            return Err(FollowUpServiceError::LeadNotFound(lead_id));
        }

        let task = FollowUpTask::new(
            NewFollowUpTask {
                lead_id: request.lead_id,
                seller_id: request.seller_id,
                title,
                description: request.description,
                due_at: request.due_at,
            },
            &*self.clock,
        );
        self.tasks.store(&task).await?;
        debug!(
            task_id = %task.id(),
            seller_id = %task.seller_id(),
            due_at = %task.due_at(),
            "follow-up task created"
        );
        Ok(task)
    }

    /// Marks a task completed. Completing a completed task is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FollowUpServiceError::TaskNotFound`] when the task does not
    /// exist and [`FollowUpServiceError::Repository`] when persistence fails.
    pub async fn complete_task(
        &self,
        task_id: FollowUpTaskId,
    ) -> FollowUpServiceResult<FollowUpTask> {
        self.set_status(task_id, FollowUpStatus::Completed).await
    }

    /// Returns a completed task to pending.
    ///
    /// # Errors
    ///
    /// Returns [`FollowUpServiceError::TaskNotFound`] when the task does not
    /// exist and [`FollowUpServiceError::Repository`] when persistence fails.
    pub async fn reopen_task(
        &self,
        task_id: FollowUpTaskId,
    ) -> FollowUpServiceResult<FollowUpTask> {
        self.set_status(task_id, FollowUpStatus::Pending).await
    }

    /// Lists a seller's tasks ordered by due time.
    ///
    /// # Errors
    ///
    /// Returns [`FollowUpServiceError::Repository`] when the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> FollowUpServiceResult<Vec<FollowUpTask>> {
        Ok(self.tasks.list_for_seller(seller_id).await?)
    }

    async fn set_status(
        &self,
        task_id: FollowUpTaskId,
        status: FollowUpStatus,
    ) -> FollowUpServiceResult<FollowUpTask> {
        let mut task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(FollowUpServiceError::TaskNotFound(task_id))?;
        if task.set_status(status, &*self.clock) {
            self.tasks.update(&task).await?;
            debug!(task_id = %task_id, status = status.as_str(), "follow-up task status changed");
        }
        Ok(task)
    }
}
