//! `PostgreSQL` repository implementation for pipeline storage.

use super::{
    conversion::{
        comment_to_row, follow_up_to_row, lead_to_row, row_to_comment, row_to_follow_up,
        row_to_lead, row_to_stage, stage_to_row,
    },
    models::{CommentRow, FollowUpTaskRow, LeadRow, StageRow},
    schema::{follow_up_tasks, lead_comments, leads, stages},
};
use crate::pipeline::{
    domain::{
        Comment, DisplayOrder, FollowUpStatus, FollowUpTask, FollowUpTaskId, Lead, LeadId, Stage,
        StageId, UserId,
    },
    ports::{
        CommentRepository, FollowUpTaskRepository, LeadRepository, PipelineRepositoryError,
        PipelineRepositoryResult, StageRepository,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by pipeline adapters.
pub type PipelinePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed repository implementing every pipeline port.
#[derive(Debug, Clone)]
pub struct PostgresPipelineRepository {
    pool: PipelinePgPool,
}

impl PostgresPipelineRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PipelinePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> PipelineRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> PipelineRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(PipelineRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(PipelineRepositoryError::persistence)?
    }
}

fn map_insert_error(
    err: DieselError,
    duplicate: PipelineRepositoryError,
) -> PipelineRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => duplicate,
        other => PipelineRepositoryError::persistence(other),
    }
}

/// Failure inside the reorder transaction.
enum ReorderFailure {
    Missing(StageId),
    Database(DieselError),
}

impl From<DieselError> for ReorderFailure {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

impl From<ReorderFailure> for PipelineRepositoryError {
    fn from(failure: ReorderFailure) -> Self {
        match failure {
            ReorderFailure::Missing(id) => Self::StageNotFound(id),
            ReorderFailure::Database(err) => Self::persistence(err),
        }
    }
}

#[async_trait]
impl StageRepository for PostgresPipelineRepository {
    async fn store(&self, stage: &Stage) -> PipelineRepositoryResult<()> {
        let stage_id = stage.id();
        let row = stage_to_row(stage)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(stages::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    map_insert_error(err, PipelineRepositoryError::DuplicateStage(stage_id))
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, stage: &Stage) -> PipelineRepositoryResult<()> {
        let stage_id = stage.id();
        let row = stage_to_row(stage)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(stages::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            if updated == 0 {
                return Err(PipelineRepositoryError::StageNotFound(stage_id));
            }
            Ok(())
        })
        .await
    }

    async fn reorder(&self, positions: &[(StageId, DisplayOrder)]) -> PipelineRepositoryResult<()> {
        let rows = positions
            .iter()
            .map(|(id, display_order)| {
                i32::try_from(display_order.value())
                    .map(|order| (*id, order))
                    .map_err(PipelineRepositoryError::persistence)
            })
            .collect::<PipelineRepositoryResult<Vec<(StageId, i32)>>>()?;
        self.run_blocking(move |connection| {
            connection
                .transaction::<(), ReorderFailure, _>(|transaction| {
                    for &(id, display_order) in &rows {
                        let updated = diesel::update(stages::table.find(id.into_inner()))
                            .set(stages::display_order.eq(display_order))
                            .execute(transaction)?;
                        if updated == 0 {
                            return Err(ReorderFailure::Missing(id));
                        }
                    }
                    Ok(())
                })
                .map_err(PipelineRepositoryError::from)
        })
        .await
    }

    async fn delete(&self, id: StageId) -> PipelineRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(stages::table.find(id.into_inner()))
                .execute(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(PipelineRepositoryError::StageNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: StageId) -> PipelineRepositoryResult<Option<Stage>> {
        self.run_blocking(move |connection| {
            let row = stages::table
                .find(id.into_inner())
                .select(StageRow::as_select())
                .first::<StageRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_stage).transpose()
        })
        .await
    }

    async fn list_ordered(&self) -> PipelineRepositoryResult<Vec<Stage>> {
        self.run_blocking(move |connection| {
            stages::table
                .order((stages::display_order.asc(), stages::name.asc()))
                .select(StageRow::as_select())
                .load::<StageRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?
                .into_iter()
                .map(row_to_stage)
                .collect()
        })
        .await
    }
}

fn load_leads(
    connection: &mut PgConnection,
    query: leads::BoxedQuery<'static, diesel::pg::Pg>,
) -> PipelineRepositoryResult<Vec<Lead>> {
    query
        .order(leads::created_at.asc())
        .select(LeadRow::as_select())
        .load::<LeadRow>(connection)
        .map_err(PipelineRepositoryError::persistence)?
        .into_iter()
        .map(row_to_lead)
        .collect()
}

#[async_trait]
impl LeadRepository for PostgresPipelineRepository {
    async fn store(&self, lead: &Lead) -> PipelineRepositoryResult<()> {
        let lead_id = lead.id();
        let row = lead_to_row(lead);
        self.run_blocking(move |connection| {
            diesel::insert_into(leads::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    map_insert_error(err, PipelineRepositoryError::DuplicateLead(lead_id))
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, lead: &Lead) -> PipelineRepositoryResult<()> {
        let lead_id = lead.id();
        let row = lead_to_row(lead);
        self.run_blocking(move |connection| {
            let updated = diesel::update(leads::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            if updated == 0 {
                return Err(PipelineRepositoryError::LeadNotFound(lead_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: LeadId) -> PipelineRepositoryResult<Option<Lead>> {
        self.run_blocking(move |connection| {
            let row = leads::table
                .find(id.into_inner())
                .select(LeadRow::as_select())
                .first::<LeadRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_lead).transpose()
        })
        .await
    }

    async fn list_all(&self) -> PipelineRepositoryResult<Vec<Lead>> {
        self.run_blocking(move |connection| load_leads(connection, leads::table.into_boxed()))
            .await
    }

    async fn list_by_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<Vec<Lead>> {
        self.run_blocking(move |connection| {
            let query = leads::table
                .filter(leads::stage_id.eq(stage_id.into_inner()))
                .into_boxed();
            load_leads(connection, query)
        })
        .await
    }

    async fn list_by_seller(&self, seller_id: UserId) -> PipelineRepositoryResult<Vec<Lead>> {
        self.run_blocking(move |connection| {
            let query = leads::table
                .filter(leads::seller_id.eq(seller_id.into_inner()))
                .into_boxed();
            load_leads(connection, query)
        })
        .await
    }

    async fn count_in_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let count = leads::table
                .filter(leads::stage_id.eq(stage_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            u64::try_from(count).map_err(PipelineRepositoryError::persistence)
        })
        .await
    }

    async fn escalate_if_in_stages(
        &self,
        id: LeadId,
        eligible: &BTreeSet<StageId>,
        target: StageId,
        at: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Option<Lead>> {
        let eligible_ids: Vec<uuid::Uuid> =
            eligible.iter().map(|stage| stage.into_inner()).collect();
        self.run_blocking(move |connection| {
            let row = diesel::update(
                leads::table
                    .filter(leads::id.eq(id.into_inner()))
                    .filter(leads::stage_id.eq_any(eligible_ids)),
            )
            .set((
                leads::stage_id.eq(target.into_inner()),
                leads::updated_at.eq(at),
            ))
            .returning(LeadRow::as_returning())
            .get_result::<LeadRow>(connection)
            .optional()
            .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_lead).transpose()
        })
        .await
    }
}

#[async_trait]
impl CommentRepository for PostgresPipelineRepository {
    async fn store(&self, comment: &Comment) -> PipelineRepositoryResult<()> {
        let comment_id = comment.id();
        let row = comment_to_row(comment);
        self.run_blocking(move |connection| {
            diesel::insert_into(lead_comments::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    map_insert_error(err, PipelineRepositoryError::DuplicateComment(comment_id))
                })?;
            Ok(())
        })
        .await
    }

    async fn list_for_lead(&self, lead_id: LeadId) -> PipelineRepositoryResult<Vec<Comment>> {
        self.run_blocking(move |connection| {
            lead_comments::table
                .filter(lead_comments::lead_id.eq(lead_id.into_inner()))
                .order(lead_comments::created_at.desc())
                .select(CommentRow::as_select())
                .load::<CommentRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?
                .into_iter()
                .map(row_to_comment)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl FollowUpTaskRepository for PostgresPipelineRepository {
    async fn store(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()> {
        let task_id = task.id();
        let row = follow_up_to_row(task);
        self.run_blocking(move |connection| {
            diesel::insert_into(follow_up_tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    map_insert_error(err, PipelineRepositoryError::DuplicateFollowUpTask(task_id))
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &FollowUpTask) -> PipelineRepositoryResult<()> {
        let task_id = task.id();
        let row = follow_up_to_row(task);
        self.run_blocking(move |connection| {
            let updated = diesel::update(follow_up_tasks::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            if updated == 0 {
                return Err(PipelineRepositoryError::FollowUpTaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: FollowUpTaskId,
    ) -> PipelineRepositoryResult<Option<FollowUpTask>> {
        self.run_blocking(move |connection| {
            let row = follow_up_tasks::table
                .find(id.into_inner())
                .select(FollowUpTaskRow::as_select())
                .first::<FollowUpTaskRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_follow_up).transpose()
        })
        .await
    }

    async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>> {
        self.run_blocking(move |connection| {
            follow_up_tasks::table
                .filter(follow_up_tasks::seller_id.eq(seller_id.into_inner()))
                .order(follow_up_tasks::due_at.asc())
                .select(FollowUpTaskRow::as_select())
                .load::<FollowUpTaskRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?
                .into_iter()
                .map(row_to_follow_up)
                .collect()
        })
        .await
    }

    async fn list_pending_due_by(
        &self,
        cutoff: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<FollowUpTask>> {
        self.run_blocking(move |connection| {
            follow_up_tasks::table
                .filter(follow_up_tasks::status.eq(FollowUpStatus::Pending.as_str()))
                .filter(follow_up_tasks::due_at.le(cutoff))
                .order(follow_up_tasks::due_at.asc())
                .select(FollowUpTaskRow::as_select())
                .load::<FollowUpTaskRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?
                .into_iter()
                .map(row_to_follow_up)
                .collect()
        })
        .await
    }
}
