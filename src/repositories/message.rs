//! # Message Repository
//!
//! Message persistence for the chat subsystem. A message and its
//! attachments form one atomic unit; attachment-bearing messages are
//! created inside a transaction so a partial row never becomes visible.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use crate::cache::FileInfo;
use crate::error::ApiError;
use crate::models::message::{self, Model};
use crate::models::message_attachment;
use crate::models::status::MessageType;

pub struct MessageRepository {
    db: DatabaseConnection,
}

impl MessageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a message by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Model>, ApiError> {
        let row = message::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find message: {}", e);
                ApiError::from(e)
            })?;

        Ok(row)
    }

    /// Persist a text message.
    pub async fn create_text(
        &self,
        conversation_id: i64,
        account_id: i64,
        content: String,
        parent_id: Option<i64>,
    ) -> Result<Model, ApiError> {
        let row = message::ActiveModel {
            conversation_id: Set(conversation_id),
            account_id: Set(account_id),
            message_type: Set(MessageType::Text.as_str().to_string()),
            content: Set(Some(content)),
            parent_id: Set(parent_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(ApiError::from)?;

        Ok(row)
    }

    /// Persist a message carrying attachments as one transaction.
    ///
    /// Attachment positions follow the order of `files`, so upload order is
    /// preserved on the wire.
    pub async fn create_with_attachments(
        &self,
        conversation_id: i64,
        account_id: i64,
        message_type: MessageType,
        parent_id: Option<i64>,
        files: &[FileInfo],
    ) -> Result<(Model, Vec<message_attachment::Model>), ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let row = message::ActiveModel {
            conversation_id: Set(conversation_id),
            account_id: Set(account_id),
            message_type: Set(message_type.as_str().to_string()),
            content: Set(None),
            parent_id: Set(parent_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ApiError::from)?;

        let mut attachments = Vec::with_capacity(files.len());
        for (position, file) in files.iter().enumerate() {
            let attachment = message_attachment::ActiveModel {
                message_id: Set(row.id),
                url: Set(file.url.clone()),
                name: Set(file.name.clone()),
                content_type: Set(file.content_type.clone()),
                size: Set(file.size),
                position: Set(position as i32),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ApiError::from)?;
            attachments.push(attachment);
        }

        txn.commit().await.map_err(ApiError::from)?;
        Ok((row, attachments))
    }
}
