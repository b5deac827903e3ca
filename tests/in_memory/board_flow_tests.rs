//! In-memory integration tests for stage administration and the board.

use crate::in_memory::helpers::Workspace;
use leadflow::pipeline::{
    domain::{DragController, DragItem, LeadDetails, Price},
    services::{
        CreateLeadRequest, DropResolution, StageRegistryError, TransitionOutcome,
        UpdateStageRequest,
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_reports_counts_and_totals_per_column() {
    let workspace = Workspace::new().await;
    let leads = workspace.lead_service();
    let stages = &workspace.registered;
    for (customer, price) in [("Acme Freight", 1_250_000), ("Borealis Foods", 80_000)] {
        leads
            .create_lead(
                CreateLeadRequest::new(
                    customer,
                    "555 0101",
                    stages.qualified.id(),
                    workspace.seller,
                )
                .with_details(
                    LeadDetails::new()
                        .with_price(Price::from_minor_units(price).expect("valid price")),
                ),
                workspace.seller,
            )
            .await
            .expect("lead creation");
    }
    workspace.lead_in(&stages.prospect, "Cobalt Mining").await;

    let board = workspace.board().load_board().await.expect("board");

    let order: Vec<_> = board
        .columns()
        .iter()
        .map(|column| column.stage().name().as_str().to_owned())
        .collect();
    assert_eq!(
        order,
        vec!["Prospect", "Qualified", "Proposal", "Won", "Lost", "Overdue"]
    );
    let qualified = board.column(stages.qualified.id()).expect("qualified column");
    assert_eq!(qualified.lead_count(), 2);
    assert_eq!(qualified.total_price_minor_units(), 1_330_000);
    assert_eq!(board.total_leads(), 3);
    assert!(board.orphaned().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dragging_a_card_to_the_exempt_column_moves_it() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let lead = workspace.lead_in(&stages.qualified, "Delta Textiles").await;
    let board_service = workspace.board();
    let board = board_service.load_board().await.expect("board");
    let mut drag = DragController::new();

    drag.begin(DragItem::Card {
        lead_id: lead.id(),
        from_stage: stages.qualified.id(),
    });
    let outcome = drag.drop_on(&board, Some(stages.prospect.id()));
    let resolution = board_service
        .apply_drop(outcome, workspace.seller)
        .await
        .expect("drop applied");

    assert!(matches!(
        resolution,
        DropResolution::Transition(TransitionOutcome::Committed(ref moved))
            if moved.stage_id() == stages.prospect.id()
    ));
    let reloaded = board_service.load_board().await.expect("board");
    assert_eq!(
        reloaded
            .column(stages.prospect.id())
            .expect("prospect column")
            .lead_count(),
        1
    );
    assert!(drag.active().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dragging_a_column_persists_the_new_order() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let board_service = workspace.board();
    let board = board_service.load_board().await.expect("board");
    let mut drag = DragController::new();

    drag.begin(DragItem::Column {
        stage_id: stages.lost.id(),
    });
    let outcome = drag.drop_on(&board, Some(stages.qualified.id()));
    let resolution = board_service
        .apply_drop(outcome, workspace.seller)
        .await
        .expect("reorder applied");

    let expected = vec![
        stages.prospect.id(),
        stages.lost.id(),
        stages.qualified.id(),
        stages.proposal.id(),
        stages.won.id(),
        stages.overdue.id(),
    ];
    let DropResolution::Reordered(catalog) = resolution else {
        panic!("expected reordered columns, got {resolution:?}");
    };
    assert_eq!(catalog.ids(), expected);
    assert_eq!(
        workspace.registry().catalog().await.expect("catalog").ids(),
        expected
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stage_edits_show_on_the_board_and_busy_stages_stay() {
    let workspace = Workspace::new().await;
    let stages = &workspace.registered;
    let registry = workspace.registry();
    workspace.lead_in(&stages.proposal, "Echo Logistics").await;

    registry
        .update_stage(
            stages.proposal.id(),
            UpdateStageRequest::new()
                .with_name("Proposal sent")
                .with_color("#FF5722"),
            workspace.seller,
        )
        .await
        .expect("stage update");
    let delete_busy = registry
        .delete_stage(stages.proposal.id(), workspace.seller)
        .await;
    let delete_escalation_target = registry
        .delete_stage(stages.overdue.id(), workspace.seller)
        .await;
    registry
        .delete_stage(stages.qualified.id(), workspace.seller)
        .await
        .expect("empty stage deletion");

    let board = workspace.board().load_board().await.expect("board");
    let proposal = board.column(stages.proposal.id()).expect("proposal column");
    assert_eq!(proposal.stage().name().as_str(), "Proposal sent");
    assert_eq!(proposal.stage().color().as_str(), "#ff5722");
    assert!(matches!(
        delete_busy,
        Err(StageRegistryError::StageInUse { lead_count: 1, .. })
    ));
    assert!(matches!(
        delete_escalation_target,
        Err(StageRegistryError::StageReferencedByRules(id)) if id == stages.overdue.id()
    ));
    assert!(board.column(stages.qualified.id()).is_none());
    assert!(board.column(stages.overdue.id()).is_some());
    assert_eq!(board.columns().len(), 5);
}
