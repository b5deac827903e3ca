//! Conditional escalation tests for the `PostgreSQL` lead repository.

use std::collections::BTreeSet;

use crate::postgres::helpers::{prepare, store_lead, store_stage};
use chrono::{TimeDelta, Utc};
use leadflow::pipeline::{domain::LeadId, ports::LeadRepository};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn escalates_lead_in_an_eligible_stage(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_escalate_eligible");
    let negotiation = store_stage(&prepared, "Negotiation", 1);
    let escalated = store_stage(&prepared, "Escalated", 2);
    let lead = store_lead(&prepared, negotiation.id());
    let eligible = BTreeSet::from([negotiation.id()]);
    let at = Utc::now() + TimeDelta::hours(1);

    let moved = prepared
        .rt
        .block_on(
            prepared
                .repo
                .escalate_if_in_stages(lead.id(), &eligible, escalated.id(), at),
        )
        .expect("escalation query")
        .expect("lead should be escalated");

    assert_eq!(moved.id(), lead.id());
    assert_eq!(moved.stage_id(), escalated.id());
    assert!(moved.updated_at() > lead.updated_at());
    let stored = prepared
        .rt
        .block_on(prepared.repo.find_by_id(lead.id()))
        .expect("find lead")
        .expect("lead exists");
    assert_eq!(stored.stage_id(), escalated.id());
}

#[rstest]
fn leaves_lead_outside_the_eligible_stages(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_escalate_ineligible");
    let prospect = store_stage(&prepared, "Prospect", 1);
    let negotiation = store_stage(&prepared, "Negotiation", 2);
    let escalated = store_stage(&prepared, "Escalated", 3);
    let lead = store_lead(&prepared, prospect.id());
    let eligible = BTreeSet::from([negotiation.id()]);

    let outcome = prepared
        .rt
        .block_on(prepared.repo.escalate_if_in_stages(
            lead.id(),
            &eligible,
            escalated.id(),
            Utc::now(),
        ))
        .expect("escalation query");

    assert!(outcome.is_none(), "lead should stay put, got: {outcome:?}");
    let stored = prepared
        .rt
        .block_on(prepared.repo.find_by_id(lead.id()))
        .expect("find lead")
        .expect("lead exists");
    assert_eq!(stored.stage_id(), prospect.id());
    assert_eq!(
        prepared
            .rt
            .block_on(prepared.repo.count_in_stage(escalated.id()))
            .expect("count escalated"),
        0
    );
}

#[rstest]
fn missing_lead_is_not_escalated(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare(shared_test_cluster, "test_escalate_missing");
    let negotiation = store_stage(&prepared, "Negotiation", 1);
    let escalated = store_stage(&prepared, "Escalated", 2);
    let eligible = BTreeSet::from([negotiation.id()]);

    let outcome = prepared
        .rt
        .block_on(prepared.repo.escalate_if_in_stages(
            LeadId::new(),
            &eligible,
            escalated.id(),
            Utc::now(),
        ))
        .expect("escalation query");

    assert!(outcome.is_none());
}
