//! Pending follow-up task queries against `PostgreSQL`.

use crate::postgres::helpers::{prepare, store_lead, store_stage, store_task};
use chrono::{TimeDelta, TimeZone, Utc};
use leadflow::pipeline::{domain::FollowUpStatus, ports::FollowUpTaskRepository};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn lists_pending_tasks_due_by_the_cutoff_in_due_order(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_pending_due_by");
    let stage = store_stage(&prepared, "Negotiation", 1);
    let lead = store_lead(&prepared, stage.id());
    let cutoff = Utc
        .with_ymd_and_hms(2026, 5, 4, 12, 0, 0)
        .single()
        .expect("valid cutoff");

    let at_cutoff = store_task(&prepared, Some(lead.id()), "Send contract", cutoff);
    let overdue = store_task(&prepared, None, "Call back", cutoff - TimeDelta::days(2));
    let mut done = store_task(
        &prepared,
        Some(lead.id()),
        "Book visit",
        cutoff - TimeDelta::hours(3),
    );
    store_task(&prepared, Some(lead.id()), "Quarterly review", cutoff + TimeDelta::seconds(1));
    assert!(done.set_status(FollowUpStatus::Completed, &DefaultClock));
    prepared
        .rt
        .block_on(prepared.repo.update(&done))
        .expect("complete task");

    let due = prepared
        .rt
        .block_on(prepared.repo.list_pending_due_by(cutoff))
        .expect("pending query");

    assert_eq!(
        due.iter().map(|task| task.id()).collect::<Vec<_>>(),
        vec![overdue.id(), at_cutoff.id()]
    );
    assert!(due.iter().all(|task| task.status() == FollowUpStatus::Pending));
}

#[rstest]
fn empty_store_has_nothing_due(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_pending_empty");

    let due = prepared
        .rt
        .block_on(prepared.repo.list_pending_due_by(Utc::now()))
        .expect("pending query");

    assert!(due.is_empty());
}
