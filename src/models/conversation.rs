//! Conversation entity model
//!
//! A chat thread: private (exactly two members, at most one per unordered
//! pair) or group (business-initiated).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "conversations")]
pub struct Model {
    /// Unique identifier for the conversation (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// `private` or `group`
    pub conversation_type: String,

    /// Optional display name (group conversations)
    pub name: Option<String>,

    /// Timestamp when the conversation was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::conversation_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::conversation_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
