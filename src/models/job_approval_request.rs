//! JobApprovalRequest entity model
//!
//! The moderation unit gating a job's published content. Update requests
//! carry the proposed field edits as a JSON payload; the initial request of
//! a freshly created job has no payload.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_approval_requests")]
pub struct Model {
    /// Unique identifier for the approval request (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning job identifier
    pub job_id: i64,

    /// Request status (lowercase, see [`crate::models::ApprovalStatus`])
    pub status: String,

    /// Proposed job-field changes for update requests
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Option<JsonValue>,

    /// Timestamp when the request was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the request was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
