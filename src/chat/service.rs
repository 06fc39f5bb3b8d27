//! Chat protocol service.
//!
//! Validates inbound events against persisted conversation and membership
//! state, persists messages, and fans outbound events out through the
//! connection registry. Every validation failure is answered with a
//! targeted error frame; the connection itself stays open.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::cache::{ConversationListCache, FileInfo, UploadCache, best_effort};
use crate::chat::events::{
    AttachmentView, InboundEvent, NewConversationEvent, NewMessageEvent, NewMessagePayload,
    TypingEvent,
};
use crate::chat::registry::{ConnectionId, ConnectionRegistry};
use crate::error::{ApiError, forbidden, invalid_state, not_found, validation_error};
use crate::models::conversation::Model as ConversationModel;
use crate::models::message::Model as MessageModel;
use crate::models::status::{AccountType, ConversationType, MessageType};
use crate::repositories::{
    AccountBasic, AccountRepository, ConversationRepository, MessageRepository,
};

enum MessageKind {
    Text,
    Attachment,
}

/// Orchestrates the websocket protocol over its collaborators.
pub struct ChatService {
    registry: Arc<ConnectionRegistry>,
    accounts: AccountRepository,
    conversations: ConversationRepository,
    messages: MessageRepository,
    uploads: Arc<UploadCache>,
    conversation_cache: Arc<ConversationListCache>,
    message_max_len: usize,
}

impl ChatService {
    pub fn new(
        db: sea_orm::DatabaseConnection,
        registry: Arc<ConnectionRegistry>,
        uploads: Arc<UploadCache>,
        conversation_cache: Arc<ConversationListCache>,
        message_max_len: usize,
    ) -> Self {
        Self {
            registry,
            accounts: AccountRepository::new(db.clone()),
            conversations: ConversationRepository::new(db.clone()),
            messages: MessageRepository::new(db),
            uploads,
            conversation_cache,
            message_max_len,
        }
    }

    /// Register a new connection and subscribe it to every conversation
    /// the account already belongs to.
    pub async fn connect(
        &self,
        account_id: i64,
        sender: UnboundedSender<String>,
    ) -> Result<ConnectionId, ApiError> {
        self.accounts.find_required(account_id).await?;

        let id = Uuid::new_v4();
        self.registry.register(account_id, id, sender);

        let conversation_ids = match best_effort("get", self.conversation_cache.get(account_id)) {
            Some(Some(ids)) => ids,
            _ => {
                let ids = self.conversations.member_conversation_ids(account_id).await?;
                best_effort("set", self.conversation_cache.set(account_id, ids.clone()));
                ids
            }
        };
        for conversation_id in conversation_ids {
            self.registry.subscribe(conversation_id, id);
        }

        tracing::debug!(account_id, connection_id = %id, "Connection registered");
        Ok(id)
    }

    pub fn disconnect(&self, id: ConnectionId) {
        if let Some(user_id) = self.registry.unregister(id) {
            // Last device gone; the list is repopulated on reconnect.
            self.conversation_cache.evict(user_id);
        }
        tracing::debug!(connection_id = %id, "Connection unregistered");
    }

    /// Entry point for one inbound frame. Errors become a targeted error
    /// frame on the offending connection and are never fatal.
    pub async fn handle_frame(&self, account_id: i64, id: ConnectionId, raw: &str) {
        let Some(event) = InboundEvent::parse(raw) else {
            self.registry.send_error(id, "Invalid message format");
            return;
        };

        let result = match event {
            InboundEvent::Text(payload) => {
                self.handle_message(account_id, id, MessageKind::Text, payload)
                    .await
            }
            InboundEvent::Attachment(payload) => {
                self.handle_message(account_id, id, MessageKind::Attachment, payload)
                    .await
            }
            InboundEvent::UserTyping {
                user_id,
                conversation_id,
            } => self.handle_typing(account_id, id, user_id, conversation_id).await,
        };

        if let Err(err) = result {
            tracing::debug!(account_id, error = %err.message, "Inbound event rejected");
            self.registry.send_error(id, &err.message);
        }
    }

    async fn handle_message(
        &self,
        account_id: i64,
        id: ConnectionId,
        kind: MessageKind,
        payload: NewMessagePayload,
    ) -> Result<(), ApiError> {
        let conversation_id = match payload.conversation_id {
            Some(conversation_id) => {
                self.ensure_member(account_id, conversation_id).await?;
                conversation_id
            }
            None => {
                let conversation = self.create_conversation(account_id, &payload).await?;
                conversation.id
            }
        };

        let parent = match payload.parent_id {
            Some(parent_id) => {
                let row = self
                    .messages
                    .find_by_id(parent_id)
                    .await?
                    .filter(|m| m.conversation_id == conversation_id)
                    .ok_or_else(|| not_found("Parent message not found"))?;
                Some(row)
            }
            None => None,
        };

        match kind {
            MessageKind::Text => {
                self.send_text(account_id, conversation_id, &payload, parent.as_ref())
                    .await?;
            }
            MessageKind::Attachment => {
                self.send_attachments(account_id, id, conversation_id, &payload, parent.as_ref())
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_text(
        &self,
        account_id: i64,
        conversation_id: i64,
        payload: &NewMessagePayload,
        parent: Option<&MessageModel>,
    ) -> Result<(), ApiError> {
        let content = payload
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| validation_error("Invalid message format", serde_json::json!({"content": "required"})))?;
        if content.chars().count() > self.message_max_len {
            return Err(validation_error(
                "Invalid message format",
                serde_json::json!({"content": "too long"}),
            ));
        }

        let row = self
            .messages
            .create_text(
                conversation_id,
                account_id,
                content.to_string(),
                parent.map(|p| p.id),
            )
            .await?;
        self.broadcast_message(&row, Vec::new(), parent).await
    }

    async fn send_attachments(
        &self,
        account_id: i64,
        _id: ConnectionId,
        conversation_id: i64,
        payload: &NewMessagePayload,
        parent: Option<&MessageModel>,
    ) -> Result<(), ApiError> {
        let names = payload.attachments.clone().unwrap_or_default();
        let mut resolved: Vec<FileInfo> = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(Some(info)) = best_effort(
                "get",
                self.uploads.get(account_id, conversation_id, name),
            ) {
                resolved.push(info);
            }
        }
        if resolved.is_empty() {
            return Err(invalid_state("Attachments is invalid"));
        }

        // Optional caption goes out first as its own text message.
        if payload
            .content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
        {
            self.send_text(account_id, conversation_id, payload, parent)
                .await?;
        }

        let (images, files): (Vec<FileInfo>, Vec<FileInfo>) =
            resolved.iter().cloned().partition(FileInfo::is_image);

        if !images.is_empty() {
            let (row, attachments) = self
                .messages
                .create_with_attachments(
                    conversation_id,
                    account_id,
                    MessageType::Image,
                    None,
                    &images,
                )
                .await?;
            let views = attachments.into_iter().map(AttachmentView::from).collect();
            self.broadcast_message(&row, views, None).await?;
        }

        for file in &files {
            let (row, attachments) = self
                .messages
                .create_with_attachments(
                    conversation_id,
                    account_id,
                    MessageType::File,
                    None,
                    std::slice::from_ref(file),
                )
                .await?;
            let views = attachments.into_iter().map(AttachmentView::from).collect();
            self.broadcast_message(&row, views, None).await?;
        }

        let consumed: Vec<String> = resolved.into_iter().map(|f| f.name).collect();
        self.uploads.remove_many(account_id, conversation_id, &consumed);
        Ok(())
    }

    async fn handle_typing(
        &self,
        account_id: i64,
        _id: ConnectionId,
        user_id: i64,
        conversation_id: i64,
    ) -> Result<(), ApiError> {
        self.ensure_member(account_id, conversation_id).await?;

        let event = TypingEvent {
            user_id,
            conversation_id,
        };
        let payload = serde_json::to_string(&event).map_err(|e| ApiError::from(anyhow::Error::from(e)))?;
        self.registry.broadcast(conversation_id, &payload);
        Ok(())
    }

    /// Idempotent conversation creation per §4.2 step 2.
    async fn create_conversation(
        &self,
        account_id: i64,
        payload: &NewMessagePayload,
    ) -> Result<ConversationModel, ApiError> {
        let mut seen = std::collections::HashSet::new();
        let others: Vec<i64> = payload
            .members
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| *m != account_id && seen.insert(*m))
            .collect();
        if others.is_empty() {
            return Err(validation_error(
                "Conversation id or members is required.",
                serde_json::json!({"members": "required"}),
            ));
        }

        let creator = self.accounts.find_required(account_id).await?;
        for member_id in &others {
            if self.accounts.find_by_id(*member_id).await?.is_none() {
                return Err(not_found(&format!("Member {} not found", member_id)));
            }
        }

        let conversation_type = if others.len() == 1 {
            if self
                .conversations
                .find_private_between(account_id, others[0])
                .await?
                .is_some()
            {
                return Err(invalid_state("Already connected to member."));
            }
            ConversationType::Private
        } else {
            let creator_type: AccountType = creator.type_account.parse()?;
            if creator_type != AccountType::Business {
                return Err(forbidden(Some(
                    "Only business account can create group conversation",
                )));
            }
            ConversationType::Group
        };

        let mut member_ids = vec![account_id];
        member_ids.extend(&others);

        let conversation = self
            .conversations
            .create_with_members(conversation_type, None, &member_ids)
            .await?;

        // Subscriptions must land before the broadcast so no member misses
        // the creation event on another device.
        for member_id in &member_ids {
            self.registry.subscribe_user(conversation.id, *member_id);
            best_effort(
                "append",
                self.conversation_cache.append(*member_id, conversation.id),
            );
        }

        let members = self.accounts.find_all_required(&member_ids).await?;
        let event = NewConversationEvent::new(
            &conversation,
            conversation_type,
            members.into_iter().map(AccountBasic::from).collect(),
        );
        let frame = serde_json::to_string(&event).map_err(|e| ApiError::from(anyhow::Error::from(e)))?;
        self.registry.broadcast(conversation.id, &frame);

        Ok(conversation)
    }

    async fn ensure_member(&self, account_id: i64, conversation_id: i64) -> Result<(), ApiError> {
        if let Some(Some(ids)) = best_effort("get", self.conversation_cache.get(account_id)) {
            if ids.contains(&conversation_id) {
                return Ok(());
            }
        }
        if self.conversations.is_member(conversation_id, account_id).await? {
            best_effort(
                "append",
                self.conversation_cache.append(account_id, conversation_id),
            );
            return Ok(());
        }
        Err(not_found(&format!(
            "Conversation {} not found in your conversations",
            conversation_id
        )))
    }

    async fn broadcast_message(
        &self,
        row: &MessageModel,
        attachments: Vec<AttachmentView>,
        parent: Option<&MessageModel>,
    ) -> Result<(), ApiError> {
        let user = self.accounts.find_required(row.account_id).await?.into();
        let event = NewMessageEvent::from_row(row, attachments, parent, user);
        let frame = serde_json::to_string(&event).map_err(|e| ApiError::from(anyhow::Error::from(e)))?;
        self.registry.broadcast(row.conversation_id, &frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn setup() -> (ChatService, DatabaseConnection, Arc<UploadCache>) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let uploads = Arc::new(UploadCache::new(Duration::from_secs(60)));
        let service = ChatService::new(
            db.clone(),
            Arc::new(ConnectionRegistry::new()),
            uploads.clone(),
            Arc::new(ConversationListCache::new()),
            255,
        );
        (service, db, uploads)
    }

    async fn insert_account(db: &DatabaseConnection, name: &str, type_account: &str) -> i64 {
        crate::models::account::ActiveModel {
            full_name: Set(name.to_string()),
            email: Set(format!("{name}@example.com")),
            type_account: Set(type_account.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn connect(
        service: &ChatService,
        account_id: i64,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = service.connect(account_id, tx).await.unwrap();
        (id, rx)
    }

    fn frame(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
        serde_json::from_str(&rx.try_recv().expect("expected a frame")).unwrap()
    }

    #[tokio::test]
    async fn malformed_frame_gets_error_and_connection_survives() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let (id, mut rx) = connect(&service, alice).await;

        service.handle_frame(alice, id, "{broken").await;
        assert_eq!(frame(&mut rx)["error"], "Invalid message format");

        // Registry still has the connection.
        assert_eq!(service.registry.connection_count(alice), 1);
    }

    #[tokio::test]
    async fn private_conversation_roundtrip_and_duplicate_rejection() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;
        let (_b, mut rx_b) = connect(&service, bob).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob}]}}"#);
        service.handle_frame(alice, a, &raw).await;

        let conv_event = frame(&mut rx_a);
        assert_eq!(conv_event["type"], "new_conversation");
        assert_eq!(conv_event["conversation_type"], "private");
        assert_eq!(conv_event["members"].as_array().unwrap().len(), 2);

        let msg_event = frame(&mut rx_a);
        assert_eq!(msg_event["type"], "new_message");
        assert_eq!(msg_event["content"], "hi");
        assert_eq!(msg_event["user"]["full_name"], "alice");

        // Bob receives both frames too.
        assert_eq!(frame(&mut rx_b)["type"], "new_conversation");
        assert_eq!(frame(&mut rx_b)["type"], "new_message");

        // A second private conversation between the same pair is rejected.
        service.handle_frame(alice, a, &raw).await;
        assert_eq!(frame(&mut rx_a)["error"], "Already connected to member.");
    }

    #[tokio::test]
    async fn group_creation_requires_business_account() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let carol = insert_account(&db, "carol", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob},{carol}]}}"#);
        service.handle_frame(alice, a, &raw).await;
        assert_eq!(
            frame(&mut rx_a)["error"],
            "Only business account can create group conversation"
        );

        let biz = insert_account(&db, "acme", "business").await;
        let (z, mut rx_z) = connect(&service, biz).await;
        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob},{carol}]}}"#);
        service.handle_frame(biz, z, &raw).await;
        assert_eq!(frame(&mut rx_z)["conversation_type"], "group");
    }

    #[tokio::test]
    async fn missing_members_and_unknown_member_are_rejected() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        service
            .handle_frame(alice, a, r#"{"type":"text","content":"hi"}"#)
            .await;
        assert_eq!(
            frame(&mut rx_a)["error"],
            "Conversation id or members is required."
        );

        service
            .handle_frame(alice, a, r#"{"type":"text","content":"hi","members":[999]}"#)
            .await;
        assert_eq!(frame(&mut rx_a)["error"], "Member 999 not found");
    }

    #[tokio::test]
    async fn non_member_cannot_post_or_type() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        service
            .handle_frame(alice, a, r#"{"type":"text","content":"hi","conversation_id":42}"#)
            .await;
        assert_eq!(
            frame(&mut rx_a)["error"],
            "Conversation 42 not found in your conversations"
        );

        service
            .handle_frame(
                alice,
                a,
                &format!(r#"{{"type":"user_typing","user_id":{alice},"conversation_id":42}}"#),
            )
            .await;
        assert_eq!(
            frame(&mut rx_a)["error"],
            "Conversation 42 not found in your conversations"
        );
    }

    #[tokio::test]
    async fn typing_is_broadcast_without_persistence() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;
        let (_b, mut rx_b) = connect(&service, bob).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob}]}}"#);
        service.handle_frame(alice, a, &raw).await;
        let conversation_id = frame(&mut rx_a)["id"].as_i64().unwrap();
        let _ = frame(&mut rx_a);
        let _ = frame(&mut rx_b);
        let _ = frame(&mut rx_b);

        let typing = format!(
            r#"{{"type":"user_typing","user_id":{alice},"conversation_id":{conversation_id}}}"#
        );
        service.handle_frame(alice, a, &typing).await;

        let event = frame(&mut rx_b);
        assert_eq!(event["user_id"].as_i64().unwrap(), alice);
        assert_eq!(event["conversation_id"].as_i64().unwrap(), conversation_id);

        let count = crate::models::message::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn attachment_event_splits_images_and_files() {
        let (service, db, uploads) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob}]}}"#);
        service.handle_frame(alice, a, &raw).await;
        let conversation_id = frame(&mut rx_a)["id"].as_i64().unwrap();
        let _ = frame(&mut rx_a);

        for (name, content_type) in [("photo.png", "image/png"), ("cv.pdf", "application/pdf")] {
            uploads
                .put(
                    alice,
                    conversation_id,
                    FileInfo {
                        name: name.to_string(),
                        url: format!("https://cdn.example.com/{name}"),
                        size: 128,
                        content_type: content_type.to_string(),
                    },
                )
                .unwrap();
        }

        let raw = format!(
            r#"{{"type":"attachment","attachments":["photo.png","cv.pdf"],"conversation_id":{conversation_id}}}"#
        );
        service.handle_frame(alice, a, &raw).await;

        let image_event = frame(&mut rx_a);
        assert_eq!(image_event["message_type"], "image");
        assert_eq!(image_event["attachments"][0]["name"], "photo.png");
        assert_eq!(image_event["attachments"][0]["position"], 0);

        let file_event = frame(&mut rx_a);
        assert_eq!(file_event["message_type"], "file");
        assert_eq!(file_event["attachments"][0]["name"], "cv.pdf");
        assert_eq!(file_event["attachments"][0]["position"], 0);

        // Consumed entries cannot back a second message.
        service.handle_frame(alice, a, &raw).await;
        assert_eq!(frame(&mut rx_a)["error"], "Attachments is invalid");
    }

    #[tokio::test]
    async fn attachment_with_caption_emits_text_first() {
        let (service, db, uploads) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob}]}}"#);
        service.handle_frame(alice, a, &raw).await;
        let conversation_id = frame(&mut rx_a)["id"].as_i64().unwrap();
        let _ = frame(&mut rx_a);

        uploads
            .put(
                alice,
                conversation_id,
                FileInfo {
                    name: "photo.png".to_string(),
                    url: "https://cdn.example.com/photo.png".to_string(),
                    size: 128,
                    content_type: "image/png".to_string(),
                },
            )
            .unwrap();

        let raw = format!(
            r#"{{"type":"attachment","content":"look at this","attachments":["photo.png"],"conversation_id":{conversation_id}}}"#
        );
        service.handle_frame(alice, a, &raw).await;

        let text_event = frame(&mut rx_a);
        assert_eq!(text_event["message_type"], "text");
        assert_eq!(text_event["content"], "look at this");

        let image_event = frame(&mut rx_a);
        assert_eq!(image_event["message_type"], "image");
    }

    #[tokio::test]
    async fn reply_parent_must_belong_to_conversation() {
        let (service, db, _) = setup().await;
        let alice = insert_account(&db, "alice", "normal").await;
        let bob = insert_account(&db, "bob", "normal").await;
        let (a, mut rx_a) = connect(&service, alice).await;

        let raw = format!(r#"{{"type":"text","content":"hi","members":[{bob}]}}"#);
        service.handle_frame(alice, a, &raw).await;
        let conversation_id = frame(&mut rx_a)["id"].as_i64().unwrap();
        let first = frame(&mut rx_a)["id"].as_i64().unwrap();

        let reply = format!(
            r#"{{"type":"text","content":"re","conversation_id":{conversation_id},"parent_id":{first}}}"#
        );
        service.handle_frame(alice, a, &reply).await;
        let event = frame(&mut rx_a);
        assert_eq!(event["parent_id"].as_i64().unwrap(), first);
        assert_eq!(event["parent"]["content"], "hi");

        let bad = format!(
            r#"{{"type":"text","content":"re","conversation_id":{conversation_id},"parent_id":9999}}"#
        );
        service.handle_frame(alice, a, &bad).await;
        assert_eq!(frame(&mut rx_a)["error"], "Parent message not found");
    }
}
