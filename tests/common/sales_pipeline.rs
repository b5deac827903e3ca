//! Stage definitions shared by the behaviour test worlds.

use std::collections::HashMap;

use leadflow::pipeline::{
    adapters::memory::InMemoryStageRepository,
    domain::{DisplayOrder, Stage, StageCategory, StageColor, StageName, StageRules},
    ports::{PipelineRepositoryResult, StageRepository},
};

/// Stages keyed by display name.
pub type StagesByName = HashMap<String, Stage>;

/// Defines Prospect, Qualified, Proposal, Won, Lost, and Escalated in that
/// column order.
///
/// # Panics
///
/// Panics if a built-in stage definition is invalid.
#[must_use]
pub fn define_stages() -> StagesByName {
    [
        ("Prospect", StageCategory::Normal),
        ("Qualified", StageCategory::Normal),
        ("Proposal", StageCategory::Normal),
        ("Won", StageCategory::Won),
        ("Lost", StageCategory::Lost),
        ("Escalated", StageCategory::Normal),
    ]
    .into_iter()
    .zip(1_i64..)
    .map(|((name, category), order)| {
        let stage = Stage::new(
            StageName::new(name).expect("valid stage name"),
            StageColor::new("#607d8b").expect("valid stage color"),
            DisplayOrder::new(order).expect("valid display order"),
            category,
        );
        (name.to_owned(), stage)
    })
    .collect()
}

/// Prospect is exempt, Won and Lost are task-optional, Proposal escalates
/// into Escalated.
#[must_use]
pub fn sales_rules(stages: &StagesByName) -> StageRules {
    let ids = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| stages.get(*name).map(Stage::id))
            .collect()
    };
    StageRules {
        exempt_stages: ids(&["Prospect"]),
        task_optional_stages: ids(&["Won", "Lost"]),
        escalation_trigger_stages: ids(&["Proposal"]),
        escalation_stage: stages.get("Escalated").map(Stage::id),
    }
}

/// Stores every stage in column order.
///
/// # Errors
///
/// Returns the first repository error.
pub async fn register(
    repo: &InMemoryStageRepository,
    stages: &StagesByName,
) -> PipelineRepositoryResult<()> {
    let mut ordered: Vec<&Stage> = stages.values().collect();
    ordered.sort_by_key(|stage| stage.display_order());
    for stage in ordered {
        repo.store(stage).await?;
    }
    Ok(())
}
