//! In-memory follow-up task repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::poisoned;
use crate::pipeline::{
    domain::{FollowUpStatus, FollowUpTask, FollowUpTaskId, UserId},
    ports::{FollowUpTaskRepository, PipelineRepositoryError, PipelineRepositoryResult},
};

/// Thread-safe in-memory follow-up task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFollowUpTaskRepository {
    tasks: Arc<RwLock<HashMap<FollowUpTaskId, FollowUpTask>>>,
}

impl InMemoryFollowUpTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_where(
        &self,
        predicate: impl Fn(&FollowUpTask) -> bool,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut matching: Vec<FollowUpTask> = tasks
            .values()
            .filter(|task| predicate(task))
            .cloned()
            .collect();
        matching.sort_by_key(FollowUpTask::due_at);
        Ok(matching)
    }
}

#[async_trait]
impl FollowUpTaskRepository for InMemoryFollowUpTaskRepository {
    async fn store(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if tasks.contains_key(&task.id()) {
            return Err(PipelineRepositoryError::DuplicateFollowUpTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let existing = tasks
            .get_mut(&task.id())
            .ok_or(PipelineRepositoryError::FollowUpTaskNotFound(task.id()))?;
        *existing = task.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: FollowUpTaskId,
    ) -> PipelineRepositoryResult<Option<FollowUpTask>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>> {
        self.collect_where(|task| task.seller_id() == seller_id)
    }

    async fn list_pending_due_by(
        &self,
        cutoff: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>> {
        self.collect_where(|task| {
            task.status() == FollowUpStatus::Pending && task.due_at() <= cutoff
        })
    }
}
