//! Account entity model
//!
//! Accounts cover both job-seeker users and business users. The chat and
//! approval subsystems only read the basic profile; credential handling
//! lives in the external auth service.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Account entity with the basic profile fields exposed on chat events
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name
    pub full_name: String,

    /// Contact email
    pub email: String,

    /// Avatar URL, if one has been uploaded
    pub avatar: Option<String>,

    /// Authorization role (e.g. user, business, admin)
    pub role: String,

    /// Account type: `normal` (job seeker) or `business`
    pub type_account: String,

    /// Timestamp when the account was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the account was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::conversation_member::Entity")]
    ConversationMembers,
}

impl Related<super::conversation_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConversationMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
