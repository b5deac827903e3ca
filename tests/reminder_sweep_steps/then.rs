//! Then steps for reminder sweep BDD scenarios.

use super::world::{SweepWorld, run_async};
use eyre::WrapErr;
use leadflow::pipeline::domain::CommentKind;
use rstest_bdd_macros::then;

#[then(r#"the lead is in stage "{stage}""#)]
fn lead_is_in_stage(world: &SweepWorld, stage: String) -> Result<(), eyre::Report> {
    let expected = world.stage(&stage)?.id();
    let stored = run_async(world.leads.find_lead(world.lead()?.id()))
        .wrap_err("look up scenario lead")?
        .ok_or_else(|| eyre::eyre!("scenario lead disappeared"))?;
    eyre::ensure!(
        stored.stage_id() == expected,
        "expected lead in {stage}, found stage {}",
        stored.stage_id()
    );
    Ok(())
}

#[then(r#"the seller received {count:usize} "{title}" notifications"#)]
fn seller_received(world: &SweepWorld, count: usize, title: String) -> Result<(), eyre::Report> {
    let lead_id = world.lead()?.id();
    let received = world
        .sink
        .delivered()
        .into_iter()
        .filter(|notification| {
            notification.recipient == Some(world.seller)
                && notification.lead_id == Some(lead_id)
                && notification.title == title
        })
        .count();
    eyre::ensure!(
        received == count,
        "expected {count} {title:?} notifications, found {received}"
    );
    Ok(())
}

#[then(r#"operators were told "{body}""#)]
fn operators_were_told(world: &SweepWorld, body: String) -> Result<(), eyre::Report> {
    let told = world
        .sink
        .delivered()
        .into_iter()
        .any(|notification| notification.recipient.is_none() && notification.body == body);
    eyre::ensure!(told, "no operator notice reading {body:?}");
    Ok(())
}

#[then("the lead carries {count:usize} system comments")]
fn lead_carries_system_comments(world: &SweepWorld, count: usize) -> Result<(), eyre::Report> {
    let comments = run_async(world.leads.list_comments(world.lead()?.id()))
        .wrap_err("list lead comments")?;
    let system = comments
        .iter()
        .filter(|comment| comment.kind() == CommentKind::System)
        .count();
    eyre::ensure!(
        system == count,
        "expected {count} system comments, found {system}"
    );
    Ok(())
}
