//! In-memory integration tests for annotated stage transitions.

use crate::in_memory::helpers::Workspace;
use chrono::{Days, Utc};
use leadflow::pipeline::{
    domain::{
        AnnotationField, AnnotationForm, AnnotationWorkflow, CommentKind, DropOutcome,
        FollowUpStatus, Lead, Stage, WorkflowState,
    },
    services::{DropResolution, TransitionError, TransitionOutcome},
};
use rstest::rstest;

async fn drop_onto(workspace: &Workspace, lead: &Lead, target: &Stage) -> AnnotationWorkflow {
    let resolution = workspace
        .board()
        .apply_drop(
            DropOutcome::MoveLead {
                lead_id: lead.id(),
                from: lead.stage_id(),
                to: target.id(),
            },
            workspace.seller,
        )
        .await
        .expect("drop applied");
    let DropResolution::Transition(TransitionOutcome::AnnotationRequired(workflow)) = resolution
    else {
        panic!("expected annotation workflow, got {resolution:?}");
    };
    *workflow
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gated_drop_records_comment_task_and_stage() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.prospect, "Fjord Marine").await;
    let due_date = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(2))
        .expect("date in range");
    let mut workflow = drop_onto(&workspace, &lead, &stages.qualified).await;

    workflow
        .fill(AnnotationForm {
            comment: "Budget confirmed for Q3".to_owned(),
            task_title: "Book a site visit".to_owned(),
            task_due_date: Some(due_date),
            ..AnnotationForm::default()
        })
        .expect("open workflow");
    let committed = workspace
        .transitions()
        .submit_annotation(&mut workflow)
        .await
        .expect("annotated transition");

    assert_eq!(workflow.state(), WorkflowState::Committed);
    let comments = workspace
        .lead_service()
        .list_comments(lead.id())
        .await
        .expect("comments");
    assert_eq!(comments, vec![committed.comment.clone()]);
    assert_eq!(committed.comment.kind(), CommentKind::User);
    let tasks = workspace
        .follow_ups()
        .list_for_seller(workspace.seller)
        .await
        .expect("tasks");
    let [task] = tasks.as_slice() else {
        panic!("expected one follow-up task, got {tasks:?}");
    };
    assert_eq!(task.lead_id(), Some(lead.id()));
    assert_eq!(task.status(), FollowUpStatus::Pending);
    assert_eq!(task.due_at().date_naive(), due_date);
    assert_eq!(
        workspace
            .lead_service()
            .find_lead(lead.id())
            .await
            .expect("lookup")
            .map(|stored| stored.stage_id()),
        Some(stages.qualified.id())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_a_deal_needs_only_a_comment() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.proposal, "Granite Works").await;
    let mut workflow = drop_onto(&workspace, &lead, &stages.won).await;
    assert!(!workflow.task_required());

    workflow
        .fill(AnnotationForm {
            comment: "Signed the annual contract".to_owned(),
            ..AnnotationForm::default()
        })
        .expect("open workflow");
    let committed = workspace
        .transitions()
        .submit_annotation(&mut workflow)
        .await
        .expect("annotated transition");

    assert_eq!(committed.lead.stage_id(), stages.won.id());
    assert!(committed.follow_up.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn incomplete_form_reports_every_missing_field() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.qualified, "Harbor Bakery").await;
    let mut workflow = drop_onto(&workspace, &lead, &stages.proposal).await;

    workflow
        .fill(AnnotationForm {
            task_due_time: "quarter past".to_owned(),
            ..AnnotationForm::default()
        })
        .expect("open workflow");
    let err = workspace
        .transitions()
        .submit_annotation(&mut workflow)
        .await
        .expect_err("form is incomplete");

    let TransitionError::ValidationFailed(errors) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    for field in [
        AnnotationField::Comment,
        AnnotationField::TaskTitle,
        AnnotationField::TaskDueDate,
        AnnotationField::TaskDueTime,
    ] {
        assert!(errors.has_error_for(field), "missing error for {field:?}");
    }
    assert_eq!(workflow.state(), WorkflowState::Open);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_workflow_leaves_the_lead_in_place() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.qualified, "Iris Optics").await;
    let mut workflow = drop_onto(&workspace, &lead, &stages.lost).await;

    workflow.cancel().expect("cancel workflow");

    assert_eq!(workflow.state(), WorkflowState::Cancelled);
    let board = workspace.board().load_board().await.expect("board");
    assert_eq!(
        board.find_lead(lead.id()).map(Lead::stage_id),
        Some(stages.qualified.id())
    );
    assert!(
        workspace
            .lead_service()
            .list_comments(lead.id())
            .await
            .expect("comments")
            .is_empty()
    );
}
