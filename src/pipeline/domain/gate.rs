//! Transition gate: decides whether a stage change commits immediately or
//! must go through the annotation workflow.

use super::{PipelineDomainError, StageCatalog, StageId, StageRules};

/// Outcome of a gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The lead is already in the requested stage.
    NoOp,
    /// The target is exempt; commit the stage change directly.
    Commit {
        /// Stage to move into.
        target: StageId,
    },
    /// The target is gated; open the annotation workflow.
    RequireAnnotation {
        /// Stage to move into once the workflow commits.
        target: StageId,
        /// Whether a follow-up task must accompany the comment.
        task_required: bool,
    },
}

/// Synchronous, side-effect free gate over a stage catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TransitionGate<'a> {
    catalog: &'a StageCatalog,
    rules: &'a StageRules,
}

impl<'a> TransitionGate<'a> {
    /// Creates a gate over the given catalog and rules.
    #[must_use]
    pub const fn new(catalog: &'a StageCatalog, rules: &'a StageRules) -> Self {
        Self { catalog, rules }
    }

    /// Decides how a change from `current` to `requested` proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidStage`] when `requested` is not
    /// in the catalog.
    pub fn decide(
        &self,
        current: StageId,
        requested: StageId,
    ) -> Result<GateDecision, PipelineDomainError> {
        if current == requested {
            return Ok(GateDecision::NoOp);
        }
        if !self.catalog.contains(requested) {
            return Err(PipelineDomainError::InvalidStage(requested));
        }
        if self.rules.is_exempt(requested) {
            return Ok(GateDecision::Commit { target: requested });
        }
        Ok(GateDecision::RequireAnnotation {
            target: requested,
            task_required: !self.rules.is_task_optional(requested),
        })
    }
}
