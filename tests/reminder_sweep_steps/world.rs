//! Shared world state for reminder sweep BDD scenarios.

use std::sync::Arc;

use super::sales_pipeline::{StagesByName, define_stages, sales_rules};
use chrono::TimeDelta;
use leadflow::pipeline::{
    adapters::memory::{
        InMemoryCommentRepository, InMemoryFollowUpTaskRepository, InMemoryLeadRepository,
        InMemoryStageRepository, RecordingNotificationSink,
    },
    domain::{Lead, Stage, UserId},
    services::{FollowUpService, LeadService, ReminderSweepService, SweepReport, SweepSettings},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Sweep service used by the BDD world.
pub type TestSweep = ReminderSweepService<
    InMemoryLeadRepository,
    InMemoryCommentRepository,
    InMemoryFollowUpTaskRepository,
    RecordingNotificationSink,
    DefaultClock,
>;

/// Lead service used by the BDD world.
pub type TestLeads = LeadService<
    InMemoryStageRepository,
    InMemoryLeadRepository,
    InMemoryCommentRepository,
    DefaultClock,
>;

/// Follow-up service used by the BDD world.
pub type TestFollowUps =
    FollowUpService<InMemoryLeadRepository, InMemoryFollowUpTaskRepository, DefaultClock>;

/// Scenario world for reminder sweep behaviour tests.
pub struct SweepWorld {
    pub stage_repo: Arc<InMemoryStageRepository>,
    pub stages: StagesByName,
    pub leads: TestLeads,
    pub follow_ups: TestFollowUps,
    pub sink: Arc<RecordingNotificationSink>,
    pub sweep: TestSweep,
    pub seller: UserId,
    pub lead: Option<Lead>,
    pub reports: Vec<SweepReport>,
}

impl SweepWorld {
    /// Creates a world with a fifteen-minute reminder window.
    ///
    /// # Panics
    ///
    /// Panics if the built-in rules lack an escalation stage.
    #[must_use]
    pub fn new() -> Self {
        let stages = define_stages();
        let settings = SweepSettings::from_rules(&sales_rules(&stages), TimeDelta::minutes(15))
            .expect("sweep settings");

        let stage_repo = Arc::new(InMemoryStageRepository::new());
        let lead_repo = Arc::new(InMemoryLeadRepository::new());
        let comment_repo = Arc::new(InMemoryCommentRepository::new());
        let task_repo = Arc::new(InMemoryFollowUpTaskRepository::new());
        let sink = Arc::new(RecordingNotificationSink::new());
        let clock = Arc::new(DefaultClock);

        Self {
            leads: LeadService::new(
                Arc::clone(&stage_repo),
                Arc::clone(&lead_repo),
                Arc::clone(&comment_repo),
                Arc::clone(&clock),
            ),
            follow_ups: FollowUpService::new(
                Arc::clone(&lead_repo),
                Arc::clone(&task_repo),
                Arc::clone(&clock),
            ),
            sweep: ReminderSweepService::new(
                lead_repo,
                comment_repo,
                task_repo,
                Arc::clone(&sink),
                clock,
                settings,
            ),
            stage_repo,
            stages,
            sink,
            seller: UserId::new(),
            lead: None,
            reports: Vec::new(),
        }
    }

    /// Looks up a stage by its display name.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario names an unknown stage.
    pub fn stage(&self, name: &str) -> Result<&Stage, eyre::Report> {
        self.stages
            .get(name)
            .ok_or_else(|| eyre::eyre!("unknown stage {name:?} in scenario"))
    }

    /// Returns the scenario lead.
    ///
    /// # Errors
    ///
    /// Returns an error when no lead has been created yet.
    pub fn lead(&self) -> Result<&Lead, eyre::Report> {
        self.lead
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing lead in scenario world"))
    }
}

impl Default for SweepWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SweepWorld {
    SweepWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
