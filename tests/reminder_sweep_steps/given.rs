//! Given steps for reminder sweep BDD scenarios.

use super::sales_pipeline::register;
use super::world::{SweepWorld, run_async};
use chrono::{TimeDelta, Utc};
use eyre::WrapErr;
use leadflow::pipeline::services::{CreateFollowUpRequest, CreateLeadRequest};
use rstest_bdd_macros::given;

#[given("a standard sales pipeline")]
fn standard_sales_pipeline(world: &SweepWorld) -> Result<(), eyre::Report> {
    run_async(register(&world.stage_repo, &world.stages)).wrap_err("register pipeline stages")
}

#[given(r#"a lead "{customer}" in stage "{stage}""#)]
fn lead_in_stage(
    world: &mut SweepWorld,
    customer: String,
    stage: String,
) -> Result<(), eyre::Report> {
    let stage_id = world.stage(&stage)?.id();
    let lead = run_async(world.leads.create_lead(
        CreateLeadRequest::new(customer, "+61 2 5550 1234", stage_id, world.seller),
        world.seller,
    ))
    .wrap_err("create lead for sweep scenario")?;
    world.lead = Some(lead);
    Ok(())
}

#[given("the lead has a follow-up task due {hours:i64} hours ago")]
fn task_overdue(world: &SweepWorld, hours: i64) -> Result<(), eyre::Report> {
    let offset = TimeDelta::try_hours(hours)
        .ok_or_else(|| eyre::eyre!("offset of {hours} hours is out of range"))?;
    create_task(world, -offset)
}

#[given("the lead has a follow-up task due in {minutes:i64} minutes")]
fn task_coming_due(world: &SweepWorld, minutes: i64) -> Result<(), eyre::Report> {
    let offset = TimeDelta::try_minutes(minutes)
        .ok_or_else(|| eyre::eyre!("offset of {minutes} minutes is out of range"))?;
    create_task(world, offset)
}

fn create_task(world: &SweepWorld, offset: TimeDelta) -> Result<(), eyre::Report> {
    let lead_id = world.lead()?.id();
    run_async(world.follow_ups.create_task(
        CreateFollowUpRequest::new(world.seller, "Call back about the quote", Utc::now() + offset)
            .for_lead(lead_id),
    ))
    .wrap_err("create follow-up task for sweep scenario")?;
    Ok(())
}
