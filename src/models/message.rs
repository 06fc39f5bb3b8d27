//! Message entity model
//!
//! A message row and its attachments are created atomically; replies carry a
//! `parent_id` that must point into the same conversation.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    /// Unique identifier for the message (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Conversation the message belongs to
    pub conversation_id: i64,

    /// Sending account
    pub account_id: i64,

    /// `text`, `image` or `file` (see [`crate::models::MessageType`])
    pub message_type: String,

    /// Text content, bounded length; absent on pure attachment messages
    pub content: Option<String>,

    /// Whether the message is pinned in its conversation
    pub is_pinned: bool,

    /// Reply-to message id within the same conversation
    pub parent_id: Option<i64>,

    /// Like reaction counter
    pub like_count: i32,

    /// Dislike reaction counter
    pub dislike_count: i32,

    /// Timestamp when the message was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the message was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conversation::Entity",
        from = "Column::ConversationId",
        to = "super::conversation::Column::Id"
    )]
    Conversation,
    #[sea_orm(has_many = "super::message_attachment::Entity")]
    Attachments,
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversation.def()
    }
}

impl Related<super::message_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
