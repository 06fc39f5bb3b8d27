//! Job entity model
//!
//! A job belongs to a business's campaign and moves through the lifecycle
//! statuses only as a result of approval-request resolution or scheduled
//! expiry.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Job entity representing a single posting under a campaign
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    /// Unique identifier for the job (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning business account identifier
    pub business_id: i64,

    /// Owning campaign identifier
    pub campaign_id: i64,

    /// Posting title
    pub title: String,

    /// Posting body
    pub description: Option<String>,

    /// Lifecycle status (lowercase, see [`crate::models::JobStatus`])
    pub status: String,

    /// Application deadline; published jobs past this date are expired
    pub deadline: Date,

    /// Whether the employer passed identity verification
    pub employer_verified: bool,

    /// Timestamp when the job was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the job was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::job_approval_request::Entity")]
    ApprovalRequests,
    #[sea_orm(has_many = "super::job_approval_log::Entity")]
    ApprovalLogs,
}

impl Related<super::job_approval_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRequests.def()
    }
}

impl Related<super::job_approval_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
