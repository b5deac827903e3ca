//! Diesel row models for pipeline persistence.

use super::schema::{follow_up_tasks, lead_comments, leads, stages};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Stage row, used for reads, inserts, and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = stages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StageRow {
    /// Stage identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Column color.
    pub color: String,
    /// Column position.
    pub display_order: i32,
    /// Stage category.
    pub category: String,
}

/// Lead row, used for reads, inserts, and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = leads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct LeadRow {
    /// Lead identifier.
    pub id: uuid::Uuid,
    /// Customer display name.
    pub customer_name: String,
    /// Customer phone number.
    pub customer_phone: String,
    /// Current stage.
    pub stage_id: uuid::Uuid,
    /// Owning seller.
    pub seller_id: uuid::Uuid,
    /// Price in minor units.
    pub price_minor_units: Option<i64>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Delivery status label.
    pub delivery_status: Option<String>,
    /// Action status label.
    pub action_status: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Comment row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = lead_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    /// Comment identifier.
    pub id: uuid::Uuid,
    /// Lead the comment belongs to.
    pub lead_id: uuid::Uuid,
    /// Author.
    pub author_id: uuid::Uuid,
    /// Comment text.
    pub body: String,
    /// Comment kind.
    pub kind: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Follow-up task row, used for reads, inserts, and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = follow_up_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct FollowUpTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Linked lead, if any.
    pub lead_id: Option<uuid::Uuid>,
    /// Owning seller.
    pub seller_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: Option<String>,
    /// Due timestamp.
    pub due_at: DateTime<Utc>,
    /// Task status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp.
    pub updated_at: DateTime<Utc>,
}
