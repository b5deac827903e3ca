//! Conversions between diesel rows and pipeline domain types.

use super::models::{CommentRow, FollowUpTaskRow, LeadRow, StageRow};
use crate::pipeline::{
    domain::{
        Comment, CommentBody, CommentId, CommentKind, CustomerName, DisplayOrder, FollowUpStatus,
        FollowUpTask, FollowUpTaskId, Lead, LeadDetails, LeadId, PersistedCommentData,
        PersistedFollowUpTaskData, PersistedLeadData, PhoneNumber, Price, Stage, StageCategory,
        StageColor, StageId, StageName, TaskTitle, UserId,
    },
    ports::{PipelineRepositoryError, PipelineRepositoryResult},
};

pub fn stage_to_row(stage: &Stage) -> PipelineRepositoryResult<StageRow> {
    let display_order = i32::try_from(stage.display_order().value())
        .map_err(PipelineRepositoryError::persistence)?;
    Ok(StageRow {
        id: stage.id().into_inner(),
        name: stage.name().as_str().to_owned(),
        color: stage.color().as_str().to_owned(),
        display_order,
        category: stage.category().as_str().to_owned(),
    })
}

pub fn row_to_stage(row: StageRow) -> PipelineRepositoryResult<Stage> {
    let name = StageName::new(row.name).map_err(PipelineRepositoryError::persistence)?;
    let color = StageColor::new(row.color).map_err(PipelineRepositoryError::persistence)?;
    let display_order = DisplayOrder::new(i64::from(row.display_order))
        .map_err(PipelineRepositoryError::persistence)?;
    let category = StageCategory::try_from(row.category.as_str())
        .map_err(PipelineRepositoryError::persistence)?;
    Ok(Stage::from_persisted(
        StageId::from_uuid(row.id),
        name,
        color,
        display_order,
        category,
    ))
}

pub fn lead_to_row(lead: &Lead) -> LeadRow {
    let details = lead.details();
    LeadRow {
        id: lead.id().into_inner(),
        customer_name: lead.customer_name().as_str().to_owned(),
        customer_phone: lead.customer_phone().as_str().to_owned(),
        stage_id: lead.stage_id().into_inner(),
        seller_id: lead.seller_id().into_inner(),
        price_minor_units: details.price().map(Price::minor_units),
        notes: details.notes().map(str::to_owned),
        delivery_status: details.delivery_status().map(str::to_owned),
        action_status: details.action_status().map(str::to_owned),
        created_at: lead.created_at(),
        updated_at: lead.updated_at(),
    }
}

pub fn row_to_lead(row: LeadRow) -> PipelineRepositoryResult<Lead> {
    let LeadRow {
        id,
        customer_name,
        customer_phone,
        stage_id,
        seller_id,
        price_minor_units,
        notes,
        delivery_status,
        action_status,
        created_at,
        updated_at,
    } = row;

    let mut details = LeadDetails::new();
    if let Some(amount) = price_minor_units {
        let price =
            Price::from_minor_units(amount).map_err(PipelineRepositoryError::persistence)?;
        details = details.with_price(price);
    }
    if let Some(value) = notes {
        details = details.with_notes(value);
    }
    if let Some(value) = delivery_status {
        details = details.with_delivery_status(value);
    }
    if let Some(value) = action_status {
        details = details.with_action_status(value);
    }

    Ok(Lead::from_persisted(PersistedLeadData {
        id: LeadId::from_uuid(id),
        customer_name: CustomerName::new(customer_name)
            .map_err(PipelineRepositoryError::persistence)?,
        customer_phone: PhoneNumber::new(customer_phone)
            .map_err(PipelineRepositoryError::persistence)?,
        stage_id: StageId::from_uuid(stage_id),
        seller_id: UserId::from_uuid(seller_id),
        details,
        created_at,
        updated_at,
    }))
}

pub fn comment_to_row(comment: &Comment) -> CommentRow {
    CommentRow {
        id: comment.id().into_inner(),
        lead_id: comment.lead_id().into_inner(),
        author_id: comment.author_id().into_inner(),
        body: comment.body().as_str().to_owned(),
        kind: comment.kind().as_str().to_owned(),
        created_at: comment.created_at(),
    }
}

pub fn row_to_comment(row: CommentRow) -> PipelineRepositoryResult<Comment> {
    Ok(Comment::from_persisted(PersistedCommentData {
        id: CommentId::from_uuid(row.id),
        lead_id: LeadId::from_uuid(row.lead_id),
        author_id: UserId::from_uuid(row.author_id),
        body: CommentBody::new(row.body).map_err(PipelineRepositoryError::persistence)?,
        kind: CommentKind::try_from(row.kind.as_str())
            .map_err(PipelineRepositoryError::persistence)?,
        created_at: row.created_at,
    }))
}

pub fn follow_up_to_row(task: &FollowUpTask) -> FollowUpTaskRow {
    FollowUpTaskRow {
        id: task.id().into_inner(),
        lead_id: task.lead_id().map(LeadId::into_inner),
        seller_id: task.seller_id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        due_at: task.due_at(),
        status: task.status().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

pub fn row_to_follow_up(row: FollowUpTaskRow) -> PipelineRepositoryResult<FollowUpTask> {
    Ok(FollowUpTask::from_persisted(PersistedFollowUpTaskData {
        id: FollowUpTaskId::from_uuid(row.id),
        lead_id: row.lead_id.map(LeadId::from_uuid),
        seller_id: UserId::from_uuid(row.seller_id),
        title: TaskTitle::new(row.title).map_err(PipelineRepositoryError::persistence)?,
        description: row.description,
        due_at: row.due_at,
        status: FollowUpStatus::try_from(row.status.as_str())
            .map_err(PipelineRepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
