//! Then steps for lead stage transition BDD scenarios.

use super::world::{TransitionWorld, run_async};
use eyre::WrapErr;
use leadflow::pipeline::{
    domain::{AnnotationField, FollowUpStatus},
    ports::FollowUpTaskRepository,
    services::{TransitionError, TransitionOutcome},
};
use rstest_bdd_macros::then;

#[then("no annotation is requested")]
fn no_annotation_requested(world: &TransitionWorld) -> Result<(), eyre::Report> {
    match &world.last_outcome {
        Some(TransitionOutcome::AnnotationRequired(_)) => {
            Err(eyre::eyre!("expected no annotation, but one was requested"))
        }
        _ if world.workflow.is_some() => Err(eyre::eyre!("unexpected open workflow")),
        _ => Ok(()),
    }
}

#[then("an annotation with a follow-up task is requested")]
fn annotation_with_task_requested(world: &TransitionWorld) -> Result<(), eyre::Report> {
    let workflow = world
        .workflow
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected an annotation workflow"))?;
    eyre::ensure!(
        workflow.task_required(),
        "expected the workflow to require a follow-up task"
    );
    Ok(())
}

#[then(r#"the lead is in stage "{stage}""#)]
fn lead_is_in_stage(world: &TransitionWorld, stage: String) -> Result<(), eyre::Report> {
    let expected = world.stage(&stage)?.id();
    let lead_id = world.lead()?.id();
    let stored = run_async(world.leads.find_lead(lead_id))
        .wrap_err("look up scenario lead")?
        .ok_or_else(|| eyre::eyre!("scenario lead disappeared"))?;
    eyre::ensure!(
        stored.stage_id() == expected,
        "expected lead in {stage}, found stage {}",
        stored.stage_id()
    );
    Ok(())
}

#[then("the lead has {count:usize} comments")]
fn lead_has_comments(world: &TransitionWorld, count: usize) -> Result<(), eyre::Report> {
    let comments = run_async(world.leads.list_comments(world.lead()?.id()))
        .wrap_err("list lead comments")?;
    eyre::ensure!(
        comments.len() == count,
        "expected {count} comments, found {}",
        comments.len()
    );
    Ok(())
}

#[then("the seller has {count:usize} pending follow-up tasks")]
fn seller_has_pending_tasks(world: &TransitionWorld, count: usize) -> Result<(), eyre::Report> {
    let tasks = run_async(world.task_repo.list_for_seller(world.seller))
        .wrap_err("list seller tasks")?;
    let pending = tasks
        .iter()
        .filter(|task| task.status() == FollowUpStatus::Pending)
        .count();
    eyre::ensure!(
        pending == count,
        "expected {count} pending tasks, found {pending}"
    );
    Ok(())
}

#[then(r#"the submission fails on field "{field}""#)]
fn submission_fails_on_field(world: &TransitionWorld, field: String) -> Result<(), eyre::Report> {
    let result = world
        .last_submission
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submission result"))?;
    let Err(TransitionError::ValidationFailed(errors)) = result else {
        return Err(eyre::eyre!("expected a validation failure, got {result:?}"));
    };
    let expected = [
        AnnotationField::Comment,
        AnnotationField::TaskTitle,
        AnnotationField::TaskDueDate,
        AnnotationField::TaskDueTime,
    ]
    .into_iter()
    .find(|candidate| candidate.as_str() == field)
    .ok_or_else(|| eyre::eyre!("unknown annotation field {field:?}"))?;
    eyre::ensure!(
        errors.has_error_for(expected),
        "expected an error for {field}, got {errors:?}"
    );
    Ok(())
}
