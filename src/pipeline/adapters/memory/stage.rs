//! In-memory stage repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::poisoned;
use crate::pipeline::{
    domain::{DisplayOrder, Stage, StageCatalog, StageId},
    ports::{PipelineRepositoryError, PipelineRepositoryResult, StageRepository},
};

/// Thread-safe in-memory stage repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStageRepository {
    stages: Arc<RwLock<HashMap<StageId, Stage>>>,
}

impl InMemoryStageRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StageRepository for InMemoryStageRepository {
    async fn store(&self, stage: &Stage) -> PipelineRepositoryResult<()> {
        let mut stages = self.stages.write().map_err(poisoned)?;
        if stages.contains_key(&stage.id()) {
            return Err(PipelineRepositoryError::DuplicateStage(stage.id()));
        }
        stages.insert(stage.id(), stage.clone());
        Ok(())
    }

    async fn update(&self, stage: &Stage) -> PipelineRepositoryResult<()> {
        let mut stages = self.stages.write().map_err(poisoned)?;
        let existing = stages
            .get_mut(&stage.id())
            .ok_or(PipelineRepositoryError::StageNotFound(stage.id()))?;
        *existing = stage.clone();
        Ok(())
    }

    async fn reorder(&self, positions: &[(StageId, DisplayOrder)]) -> PipelineRepositoryResult<()> {
        let mut stages = self.stages.write().map_err(poisoned)?;
        if let Some((missing, _)) = positions.iter().find(|(id, _)| !stages.contains_key(id)) {
            return Err(PipelineRepositoryError::StageNotFound(*missing));
        }
        for (id, display_order) in positions {
            if let Some(stage) = stages.get_mut(id) {
                stage.set_display_order(*display_order);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: StageId) -> PipelineRepositoryResult<()> {
        let mut stages = self.stages.write().map_err(poisoned)?;
        stages
            .remove(&id)
            .map(|_| ())
            .ok_or(PipelineRepositoryError::StageNotFound(id))
    }

    async fn find_by_id(&self, id: StageId) -> PipelineRepositoryResult<Option<Stage>> {
        let stages = self.stages.read().map_err(poisoned)?;
        Ok(stages.get(&id).cloned())
    }

    async fn list_ordered(&self) -> PipelineRepositoryResult<Vec<Stage>> {
        let stages = self.stages.read().map_err(poisoned)?;
        let catalog = StageCatalog::new(stages.values().cloned().collect());
        Ok(catalog.stages().to_vec())
    }
}
