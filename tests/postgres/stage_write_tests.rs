//! Stage write tests: uniqueness constraints and atomic reordering.

use crate::postgres::helpers::{prepare, store_lead, store_stage};
use leadflow::pipeline::{
    domain::{DisplayOrder, StageId},
    ports::{LeadRepository, PipelineRepositoryError, StageRepository},
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

fn order(value: i64) -> DisplayOrder {
    DisplayOrder::new(value).expect("valid display order")
}

#[rstest]
fn store_rejects_duplicate_stage_id(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_dup_stage");
    let stage = store_stage(&prepared, "Prospect", 1);

    let result = prepared.rt.block_on(StageRepository::store(&prepared.repo, &stage));

    assert!(
        matches!(result, Err(PipelineRepositoryError::DuplicateStage(id)) if id == stage.id()),
        "Expected DuplicateStage error, got: {result:?}"
    );
}

#[rstest]
fn store_rejects_duplicate_lead_id(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_dup_lead");
    let stage = store_stage(&prepared, "Prospect", 1);
    let lead = store_lead(&prepared, stage.id());

    let result = prepared.rt.block_on(LeadRepository::store(&prepared.repo, &lead));

    assert!(
        matches!(result, Err(PipelineRepositoryError::DuplicateLead(id)) if id == lead.id()),
        "Expected DuplicateLead error, got: {result:?}"
    );
}

#[rstest]
fn reorder_stores_every_position(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_reorder");
    let first = store_stage(&prepared, "Prospect", 1);
    let second = store_stage(&prepared, "Proposal", 2);

    prepared
        .rt
        .block_on(prepared.repo.reorder(&[(second.id(), order(1)), (first.id(), order(2))]))
        .expect("reorder");

    let stored = prepared
        .rt
        .block_on(prepared.repo.list_ordered())
        .expect("list stages");
    assert_eq!(
        stored.iter().map(|stage| stage.id()).collect::<Vec<_>>(),
        vec![second.id(), first.id()]
    );
}

#[rstest]
fn reorder_with_a_missing_stage_rolls_back(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_reorder_rollback");
    let first = store_stage(&prepared, "Prospect", 1);
    let second = store_stage(&prepared, "Proposal", 2);
    let missing = StageId::new();

    let result = prepared.rt.block_on(prepared.repo.reorder(&[
        (second.id(), order(1)),
        (missing, order(2)),
        (first.id(), order(3)),
    ]));

    assert!(
        matches!(result, Err(PipelineRepositoryError::StageNotFound(id)) if id == missing),
        "Expected StageNotFound error, got: {result:?}"
    );
    let stored = prepared
        .rt
        .block_on(prepared.repo.list_ordered())
        .expect("list stages");
    assert_eq!(
        stored
            .iter()
            .map(|stage| (stage.id(), stage.display_order().value()))
            .collect::<Vec<_>>(),
        vec![(first.id(), 1), (second.id(), 2)]
    );
}
