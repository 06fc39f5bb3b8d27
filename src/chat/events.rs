//! Wire events for the chat protocol.
//!
//! Inbound frames are JSON tagged by `type`; anything that fails to parse
//! is answered with an `{"error": "Invalid message format"}` frame and the
//! connection stays open. Outbound frames carry their own `type` tag.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::message::Model as MessageModel;
use crate::models::message_attachment::Model as AttachmentModel;
use crate::models::status::ConversationType;
use crate::repositories::AccountBasic;

/// Payload shared by `text` and `attachment` inbound frames.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewMessagePayload {
    #[serde(default)]
    pub content: Option<String>,
    /// Other member account ids; present only for new-conversation requests.
    #[serde(default)]
    pub members: Option<Vec<i64>>,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// File names previously validated by the upload endpoint.
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

/// Inbound client events.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Text(NewMessagePayload),
    Attachment(NewMessagePayload),
    UserTyping {
        user_id: i64,
        conversation_id: i64,
    },
}

impl InboundEvent {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// One attachment on an outbound message event, in display order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttachmentView {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub position: i32,
}

impl From<AttachmentModel> for AttachmentView {
    fn from(model: AttachmentModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            url: model.url,
            size: model.size,
            content_type: model.content_type,
            position: model.position,
        }
    }
}

/// Condensed view of a reply target.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParentPreview {
    pub id: i64,
    pub account_id: i64,
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<&MessageModel> for ParentPreview {
    fn from(model: &MessageModel) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            message_type: model.message_type.clone(),
            content: model.content.clone(),
        }
    }
}

/// Broadcast for every persisted message row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NewMessageEvent {
    #[serde(rename = "type")]
    pub event: &'static str,
    pub message_type: String,
    pub id: i64,
    pub conversation_id: i64,
    pub account_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub created_at: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub is_pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentView>>,
    pub user: AccountBasic,
}

impl NewMessageEvent {
    pub fn from_row(
        message: &MessageModel,
        attachments: Vec<AttachmentView>,
        parent: Option<&MessageModel>,
        user: AccountBasic,
    ) -> Self {
        Self {
            event: "new_message",
            message_type: message.message_type.clone(),
            id: message.id,
            conversation_id: message.conversation_id,
            account_id: message.account_id,
            content: message.content.clone(),
            created_at: message.created_at.to_rfc3339(),
            like_count: message.like_count,
            dislike_count: message.dislike_count,
            is_pinned: message.is_pinned,
            parent_id: message.parent_id,
            parent: parent.map(ParentPreview::from),
            attachments: if attachments.is_empty() {
                None
            } else {
                Some(attachments)
            },
            user,
        }
    }
}

/// Broadcast to every member when a conversation is created.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NewConversationEvent {
    #[serde(rename = "type")]
    pub event: &'static str,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub conversation_type: ConversationType,
    pub created_at: String,
    pub members: Vec<AccountBasic>,
}

impl NewConversationEvent {
    pub fn new(
        conversation: &crate::models::conversation::Model,
        conversation_type: ConversationType,
        members: Vec<AccountBasic>,
    ) -> Self {
        Self {
            event: "new_conversation",
            id: conversation.id,
            name: conversation.name.clone(),
            conversation_type,
            created_at: conversation.created_at.to_rfc3339(),
            members,
        }
    }
}

/// Typing notification, relayed without persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TypingEvent {
    pub user_id: i64,
    pub conversation_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_text_frame_parses() {
        let raw = r#"{"type":"text","content":"hi","conversation_id":7}"#;
        match InboundEvent::parse(raw) {
            Some(InboundEvent::Text(payload)) => {
                assert_eq!(payload.content.as_deref(), Some("hi"));
                assert_eq!(payload.conversation_id, Some(7));
                assert!(payload.members.is_none());
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn inbound_typing_frame_parses() {
        let raw = r#"{"type":"user_typing","user_id":1,"conversation_id":7}"#;
        match InboundEvent::parse(raw) {
            Some(InboundEvent::UserTyping {
                user_id,
                conversation_id,
            }) => {
                assert_eq!(user_id, 1);
                assert_eq!(conversation_id, 7);
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(InboundEvent::parse("not json").is_none());
        assert!(InboundEvent::parse(r#"{"type":"unknown"}"#).is_none());
        assert!(InboundEvent::parse(r#"{"content":"no type"}"#).is_none());
    }
}
