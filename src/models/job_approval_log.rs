//! JobApprovalLog entity model
//!
//! Append-only audit trail of status transitions. Rows are never updated or
//! deleted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_approval_logs")]
pub struct Model {
    /// Unique identifier for the log row (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Job the transition applies to
    pub job_id: i64,

    /// Admin account that resolved the request
    pub admin_id: i64,

    /// Job status before the transition (see [`crate::models::LogStatus`])
    pub previous_status: String,

    /// Requested approval outcome
    pub new_status: String,

    /// Optional free-text reason supplied by the admin
    pub reason: Option<String>,

    /// Timestamp when the transition was recorded
    pub created_at: DateTimeWithTimeZone,
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
