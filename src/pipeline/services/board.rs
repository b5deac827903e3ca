//! Service layer backing the kanban board.

use crate::pipeline::{
    domain::{Board, DropOutcome, LeadId, PipelineDomainError, StageCatalog, StageId, UserId},
    ports::{
        CommentRepository, FollowUpTaskRepository, LeadRepository, PipelineRepositoryError,
        StageRepository,
    },
};
use super::transition::{
    LeadTransitionService, StageChangeRequest, TransitionError, TransitionOutcome,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What applying a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResolution {
    /// The drop was cancelled or landed where it started.
    Ignored,
    /// A card drop was routed through the transition gate.
    Transition(TransitionOutcome),
    /// Columns were reordered; holds the persisted catalog.
    Reordered(StageCatalog),
}

/// Service-level errors for board operations.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The requested column order is not a permutation of the stages.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// A card move failed in the transition service.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// Persisting a column reorder failed; `restored` is the order reloaded
    /// from storage.
    #[error("column reorder failed: {source}")]
    ReorderFailed {
        /// Stage catalog the board should render instead.
        restored: StageCatalog,
        /// Underlying repository error.
        source: PipelineRepositoryError,
    },
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Board loading, card moves, and column reordering.
#[derive(Clone)]
pub struct BoardService<S, L, M, T, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    stages: Arc<S>,
    leads: Arc<L>,
    transitions: LeadTransitionService<S, L, M, T, C>,
}

impl<S, L, M, T, C> BoardService<S, L, M, T, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    T: FollowUpTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a board service that routes card moves through
    /// `transitions`.
    #[must_use]
    pub const fn new(
        stages: Arc<S>,
        leads: Arc<L>,
        transitions: LeadTransitionService<S, L, M, T, C>,
    ) -> Self {
        Self {
            stages,
            leads,
            transitions,
        }
    }

    /// Loads every stage with its leads.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repository`] when stages or leads cannot be
    /// listed.
    pub async fn load_board(&self) -> BoardResult<Board> {
        let catalog = StageCatalog::new(self.stages.list_ordered().await?);
        let leads = self.leads.list_all().await?;
        let board = Board::assemble(&catalog, leads);
        if !board.orphaned().is_empty() {
            warn!(
                orphaned = board.orphaned().len(),
                "leads reference stages missing from the registry"
            );
        }
        Ok(board)
    }

    /// Moves a lead to another column through the transition gate.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Transition`] when the transition service
    /// rejects the move.
    pub async fn move_lead(
        &self,
        lead_id: LeadId,
        target: StageId,
        actor: UserId,
    ) -> BoardResult<TransitionOutcome> {
        Ok(self
            .transitions
            .request_stage_change(StageChangeRequest {
                lead_id,
                target,
                actor,
            })
            .await?)
    }

    /// Applies the outcome of a finished drag.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::move_lead`] for card drops and of
    /// [`Self::reorder_columns`] for column drops.
    pub async fn apply_drop(
        &self,
        outcome: DropOutcome,
        actor: UserId,
    ) -> BoardResult<DropResolution> {
        match outcome {
            DropOutcome::Cancelled | DropOutcome::Unchanged => Ok(DropResolution::Ignored),
            DropOutcome::MoveLead { lead_id, to, .. } => self
                .move_lead(lead_id, to, actor)
                .await
                .map(DropResolution::Transition),
            DropOutcome::ReorderColumns { order } => self
                .reorder_columns(&order, actor)
                .await
                .map(DropResolution::Reordered),
        }
    }

    /// Persists a new column order as display orders `1..=N`.
    ///
    /// The new positions are written in one atomic repository call, so a
    /// failed write leaves the stored order untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Domain`] unless `order` lists every stage
    /// exactly once, and [`BoardError::ReorderFailed`] with the order
    /// reloaded from storage when the write fails.
    pub async fn reorder_columns(
        &self,
        order: &[StageId],
        actor: UserId,
    ) -> BoardResult<StageCatalog> {
        let snapshot = StageCatalog::new(self.stages.list_ordered().await?);
        let positions = snapshot.dense_order(order)?;

        let mut reordered = Vec::with_capacity(positions.len());
        for &(stage_id, display_order) in &positions {
            let Some(current) = snapshot.get(stage_id) else {
                return Err(PipelineDomainError::InvalidStage(stage_id).into());
            };
            let mut stage = current.clone();
            stage.set_display_order(display_order);
            reordered.push(stage);
        }

        if let Err(source) = self.stages.reorder(&positions).await {
            return Err(self.restore_after_failure(snapshot, source).await);
        }

        info!(actor = %actor, columns = reordered.len(), "columns reordered");
        Ok(StageCatalog::new(reordered))
    }

    async fn restore_after_failure(
        &self,
        snapshot: StageCatalog,
        source: PipelineRepositoryError,
    ) -> BoardError {
        warn!(error = %source, "column reorder failed, reloading stage order");
        let restored = match self.stages.list_ordered().await {
            Ok(stages) => StageCatalog::new(stages),
            Err(reload) => {
                debug!(error = %reload, "stage reload failed, keeping pre-reorder order");
                snapshot
            }
        };
        BoardError::ReorderFailed { restored, source }
    }
}
