//! Stage rule sets that drive the transition gate and the reminder sweep.
//!
//! All rules key off [`StageId`]. Stage names are display data only and never
//! participate in a rule.

use super::{StageCatalog, StageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Deployment-specific stage rules.
///
/// The exempt set and the task-optional set are configured independently;
/// neither is derived from the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageRules {
    /// Stages a lead may enter without the annotation workflow.
    pub exempt_stages: BTreeSet<StageId>,
    /// Gated stages that require a comment but no follow-up task.
    pub task_optional_stages: BTreeSet<StageId>,
    /// Stages whose leads are escalated when a linked task becomes overdue.
    pub escalation_trigger_stages: BTreeSet<StageId>,
    /// The single stage overdue leads are moved into.
    pub escalation_stage: Option<StageId>,
}

/// Inconsistencies detected in a [`StageRules`] value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageRulesError {
    /// The escalation stage is also listed as a trigger stage.
    #[error("escalation stage {0} must not be an escalation trigger stage")]
    EscalationStageIsTrigger(StageId),

    /// Rules reference stages missing from the registry.
    #[error("stage rules reference unknown stages: {0:?}")]
    UnknownStages(Vec<StageId>),
}

impl StageRules {
    /// Returns `true` when entering `stage` skips the annotation workflow.
    #[must_use]
    pub fn is_exempt(&self, stage: StageId) -> bool {
        self.exempt_stages.contains(&stage)
    }

    /// Returns `true` when a gated transition into `stage` needs no task.
    #[must_use]
    pub fn is_task_optional(&self, stage: StageId) -> bool {
        self.task_optional_stages.contains(&stage)
    }

    /// Returns `true` when overdue tasks escalate leads sitting in `stage`.
    #[must_use]
    pub fn is_escalation_trigger(&self, stage: StageId) -> bool {
        self.escalation_trigger_stages.contains(&stage)
    }

    /// Returns `true` when any rule names `stage`.
    #[must_use]
    pub fn references(&self, stage: StageId) -> bool {
        self.is_exempt(stage)
            || self.is_task_optional(stage)
            || self.is_escalation_trigger(stage)
            || self.escalation_stage == Some(stage)
    }

    /// Checks the rules for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`StageRulesError::EscalationStageIsTrigger`] when escalating
    /// would move a lead into a stage that escalates again.
    pub fn validate(&self) -> Result<(), StageRulesError> {
        match self.escalation_stage {
            Some(stage) if self.is_escalation_trigger(stage) => {
                Err(StageRulesError::EscalationStageIsTrigger(stage))
            }
            _ => Ok(()),
        }
    }

    /// Checks every referenced stage exists in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`StageRulesError::UnknownStages`] listing the missing ids.
    pub fn validate_against(&self, catalog: &StageCatalog) -> Result<(), StageRulesError> {
        let unknown: Vec<StageId> = self
            .referenced_stages()
            .into_iter()
            .filter(|id| !catalog.contains(*id))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(StageRulesError::UnknownStages(unknown))
        }
    }

    fn referenced_stages(&self) -> BTreeSet<StageId> {
        self.exempt_stages
            .iter()
            .chain(&self.task_optional_stages)
            .chain(&self.escalation_trigger_stages)
            .chain(self.escalation_stage.iter())
            .copied()
            .collect()
    }
}
