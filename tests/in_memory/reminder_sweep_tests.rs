//! In-memory integration tests for the reminder sweep.

use std::sync::Arc;

use crate::in_memory::helpers::Workspace;
use chrono::{TimeDelta, Utc};
use leadflow::config::PipelineConfig;
use leadflow::pipeline::{
    adapters::{
        log::LogNotificationSink,
        memory::{
            InMemoryCommentRepository, InMemoryFollowUpTaskRepository, InMemoryLeadRepository,
            RecordingNotificationSink,
        },
    },
    domain::{CommentKind, FollowUpTask, Lead},
    ports::NotificationSink,
    services::{CreateFollowUpRequest, ReminderSweepService, StageRegistryError, SweepSettings},
};
use mockable::DefaultClock;
use rstest::rstest;

fn configured_settings(workspace: &Workspace) -> SweepSettings {
    let stages = &workspace.registered;
    let text = format!(
        r#"
        [rules]
        exempt_stages = ["{prospect}"]
        task_optional_stages = ["{won}", "{lost}"]
        escalation_trigger_stages = ["{proposal}"]
        escalation_stage = "{overdue}"

        [sweep]
        lookahead_secs = 900
        "#,
        prospect = stages.prospect.id(),
        won = stages.won.id(),
        lost = stages.lost.id(),
        proposal = stages.proposal.id(),
        overdue = stages.overdue.id(),
    );
    let config = PipelineConfig::from_toml_str(&text).expect("config parses");
    assert_eq!(config.rules, workspace.rules());
    config.sweep_settings().expect("sweep settings")
}

fn sweep_with<N: NotificationSink>(
    workspace: &Workspace,
    sink: Arc<N>,
) -> ReminderSweepService<
    InMemoryLeadRepository,
    InMemoryCommentRepository,
    InMemoryFollowUpTaskRepository,
    N,
    DefaultClock,
> {
    ReminderSweepService::new(
        Arc::clone(&workspace.leads),
        Arc::clone(&workspace.comments),
        Arc::clone(&workspace.tasks),
        sink,
        Arc::clone(&workspace.clock),
        configured_settings(workspace),
    )
}

async fn task_for(workspace: &Workspace, lead: &Lead, due_in: TimeDelta) -> FollowUpTask {
    workspace
        .follow_ups()
        .create_task(
            CreateFollowUpRequest::new(workspace.seller, "Chase signature", Utc::now() + due_in)
                .for_lead(lead.id()),
        )
        .await
        .expect("task creation")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overdue_proposal_moves_to_the_escalation_column() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let stale = workspace.lead_in(&stages.proposal, "Juniper Hotels").await;
    let fresh = workspace.lead_in(&stages.proposal, "Kestrel Air").await;
    task_for(&workspace, &stale, TimeDelta::hours(-2)).await;
    task_for(&workspace, &fresh, TimeDelta::days(3)).await;
    let sink = Arc::new(RecordingNotificationSink::new());
    let mut sweep = sweep_with(&workspace, Arc::clone(&sink));

    let report = sweep.run_pass().await;

    assert!(report.is_clean());
    assert_eq!(report.escalated, vec![stale.id()]);
    let board = workspace.board().load_board().await.expect("board");
    assert_eq!(
        board.find_lead(stale.id()).map(Lead::stage_id),
        Some(stages.overdue.id())
    );
    assert_eq!(
        board.find_lead(fresh.id()).map(Lead::stage_id),
        Some(stages.proposal.id())
    );
    let comments = workspace
        .lead_service()
        .list_comments(stale.id())
        .await
        .expect("comments");
    assert!(
        comments
            .iter()
            .all(|comment| comment.kind() == CommentKind::System)
    );
    assert_eq!(comments.len(), 1);
    let titles: Vec<String> = sink
        .delivered()
        .into_iter()
        .map(|notification| notification.title)
        .collect();
    assert_eq!(titles, vec!["Follow-up overdue", "Leads escalated"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_follow_up_stops_reminders() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.qualified, "Lumen Studios").await;
    let task = task_for(&workspace, &lead, TimeDelta::minutes(10)).await;
    workspace
        .follow_ups()
        .complete_task(task.id())
        .await
        .expect("complete task");
    let sink = Arc::new(RecordingNotificationSink::new());
    let mut sweep = sweep_with(&workspace, Arc::clone(&sink));

    let report = sweep.run_pass().await;

    assert!(report.is_clean());
    assert_eq!(report.notifications_sent, 0);
    assert!(sink.delivered().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_sink_accepts_reminders() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.qualified, "Meridian Co").await;
    task_for(&workspace, &lead, TimeDelta::minutes(5)).await;
    let mut sweep = sweep_with(&workspace, Arc::new(LogNotificationSink));

    let report = sweep.run_pass().await;

    assert!(report.is_clean());
    assert_eq!(report.notifications_sent, 1);
    assert!(report.escalated.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn escalation_target_survives_a_delete_request() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.proposal, "Nimbus Labs").await;
    task_for(&workspace, &lead, TimeDelta::hours(-1)).await;
    let refused = workspace
        .registry()
        .delete_stage(stages.overdue.id(), workspace.seller)
        .await;
    let mut sweep = sweep_with(&workspace, Arc::new(RecordingNotificationSink::new()));

    let report = sweep.run_pass().await;

    assert!(matches!(
        refused,
        Err(StageRegistryError::StageReferencedByRules(id)) if id == stages.overdue.id()
    ));
    assert_eq!(report.escalated, vec![lead.id()]);
    let board = workspace.board().load_board().await.expect("board");
    assert!(board.orphaned().is_empty());
    assert_eq!(
        board.find_lead(lead.id()).map(Lead::stage_id),
        Some(stages.overdue.id())
    );
}
