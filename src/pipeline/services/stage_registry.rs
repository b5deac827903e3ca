//! Service layer for administering the stage registry.

use crate::pipeline::{
    domain::{
        PipelineDomainError, Stage, StageCatalog, StageCategory, StageColor, StageId, StageName,
        StageRules, UserId,
    },
    ports::{LeadRepository, PipelineRepositoryError, StageRepository},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for registering a new stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStageRequest {
    name: String,
    color: String,
    category: StageCategory,
}

impl CreateStageRequest {
    /// Creates a request for a `normal` stage.
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            category: StageCategory::Normal,
        }
    }

    /// Sets the stage category.
    #[must_use]
    pub const fn with_category(mut self, category: StageCategory) -> Self {
        self.category = category;
        self
    }
}

/// Request payload for editing a stage. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStageRequest {
    name: Option<String>,
    color: Option<String>,
    category: Option<StageCategory>,
}

impl UpdateStageRequest {
    /// Creates an empty edit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the stage.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Changes the column color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Changes the stage category.
    #[must_use]
    pub const fn with_category(mut self, category: StageCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Service-level errors for stage administration.
#[derive(Debug, Error)]
pub enum StageRegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// The stage does not exist.
    #[error("stage not found: {0}")]
    StageNotFound(StageId),
    /// Leads still sit in the stage.
    #[error("stage {stage_id} still holds {lead_count} leads")]
    StageInUse {
        /// Stage that was to be deleted.
        stage_id: StageId,
        /// Number of leads currently in the stage.
        lead_count: u64,
    },
    /// A configured stage rule names the stage.
    #[error("stage {0} is named in the stage rules")]
    StageReferencedByRules(StageId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
}

/// Result type for stage registry operations.
pub type StageRegistryResult<T> = Result<T, StageRegistryError>;

/// Stage registry administration service.
#[derive(Clone)]
pub struct StageRegistryService<S, L>
where
    S: StageRepository,
    L: LeadRepository,
{
    stages: Arc<S>,
    leads: Arc<L>,
    rules: StageRules,
}

impl<S, L> StageRegistryService<S, L>
where
    S: StageRepository,
    L: LeadRepository,
{
    /// Creates a stage registry service with no stage rules.
    #[must_use]
    pub fn new(stages: Arc<S>, leads: Arc<L>) -> Self {
        Self {
            stages,
            leads,
            rules: StageRules::default(),
        }
    }

    /// Protects the stages named in `rules` from deletion.
    #[must_use]
    pub fn with_rules(mut self, rules: StageRules) -> Self {
        self.rules = rules;
        self
    }

    /// Loads the current stage catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StageRegistryError::Repository`] when the stages cannot be
    /// listed.
    pub async fn catalog(&self) -> StageRegistryResult<StageCatalog> {
        Ok(StageCatalog::new(self.stages.list_ordered().await?))
    }

    /// Registers a new stage as the last column.
    ///
    /// # Errors
    ///
    /// Returns [`StageRegistryError::Domain`] for an invalid name or color,
    /// and [`StageRegistryError::Repository`] when persistence fails.
    pub async fn create_stage(
        &self,
        request: CreateStageRequest,
        actor: UserId,
    ) -> StageRegistryResult<Stage> {
        let name = StageName::new(request.name)?;
        let color = StageColor::new(request.color)?;
        let display_order = self.catalog().await?.next_display_order()?;

        let stage = Stage::new(name, color, display_order, request.category);
        self.stages.store(&stage).await?;
        info!(
            stage_id = %stage.id(),
            actor = %actor,
            name = stage.name().as_str(),
            display_order = stage.display_order().value(),
            "stage created"
        );
        Ok(stage)
    }

    /// Applies an edit to an existing stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageRegistryError::StageNotFound`] when the stage does not
    /// exist, [`StageRegistryError::Domain`] for invalid values, and
    /// [`StageRegistryError::Repository`] when persistence fails.
    pub async fn update_stage(
        &self,
        stage_id: StageId,
        request: UpdateStageRequest,
        actor: UserId,
    ) -> StageRegistryResult<Stage> {
        let mut stage = self
            .stages
            .find_by_id(stage_id)
            .await?
            .ok_or(StageRegistryError::StageNotFound(stage_id))?;

        if let Some(name) = request.name {
            stage.rename(StageName::new(name)?);
        }
        if let Some(color) = request.color {
            stage.recolor(StageColor::new(color)?);
        }
        if let Some(category) = request.category {
            stage.recategorize(category);
        }

        self.stages.update(&stage).await?;
        info!(stage_id = %stage_id, actor = %actor, "stage updated");
        Ok(stage)
    }

    /// Deletes a stage that no lead and no stage rule references.
    ///
    /// # Errors
    ///
    /// Returns [`StageRegistryError::StageInUse`] while leads remain in the
    /// stage, [`StageRegistryError::StageReferencedByRules`] when a rule
    /// names it, [`StageRegistryError::StageNotFound`] when it does not
    /// exist, and [`StageRegistryError::Repository`] when persistence fails.
    pub async fn delete_stage(&self, stage_id: StageId, actor: UserId) -> StageRegistryResult<()> {
        if self.stages.find_by_id(stage_id).await?.is_none() {
            return Err(StageRegistryError::StageNotFound(stage_id));
        }
        if self.rules.references(stage_id) {
            return Err(StageRegistryError::StageReferencedByRules(stage_id));
        }
        let lead_count = self.leads.count_in_stage(stage_id).await?;
        if lead_count > 0 {
            return Err(StageRegistryError::StageInUse {
                stage_id,
                lead_count,
            });
        }

        self.stages.delete(stage_id).await?;
        info!(stage_id = %stage_id, actor = %actor, "stage deleted");
        Ok(())
    }
}
