//! # Conversation Repository
//!
//! Membership lookups and atomic conversation creation. The chat service
//! layers its cache and broadcast logic on top of these queries.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::error::ApiError;
use crate::models::conversation::{self, Model};
use crate::models::conversation_member;
use crate::models::status::ConversationType;

pub struct ConversationRepository {
    db: DatabaseConnection,
}

impl ConversationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Whether an account is a current member of a conversation.
    pub async fn is_member(&self, conversation_id: i64, account_id: i64) -> Result<bool, ApiError> {
        let row = conversation_member::Entity::find()
            .filter(conversation_member::Column::ConversationId.eq(conversation_id))
            .filter(conversation_member::Column::AccountId.eq(account_id))
            .one(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok(row.is_some())
    }

    /// Ids of every conversation an account belongs to, in join order.
    pub async fn member_conversation_ids(&self, account_id: i64) -> Result<Vec<i64>, ApiError> {
        let rows = conversation_member::Entity::find()
            .filter(conversation_member::Column::AccountId.eq(account_id))
            .order_by_asc(conversation_member::Column::Id)
            .all(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok(rows.into_iter().map(|m| m.conversation_id).collect())
    }

    /// The private conversation between two accounts, if one exists.
    ///
    /// The member pair is unordered; at most one such conversation exists.
    pub async fn find_private_between(
        &self,
        account_a: i64,
        account_b: i64,
    ) -> Result<Option<Model>, ApiError> {
        let candidate_ids: Vec<i64> = conversation_member::Entity::find()
            .filter(conversation_member::Column::AccountId.eq(account_a))
            .all(&self.db)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|m| m.conversation_id)
            .collect();

        if candidate_ids.is_empty() {
            return Ok(None);
        }

        let shared: Vec<i64> = conversation_member::Entity::find()
            .filter(conversation_member::Column::AccountId.eq(account_b))
            .filter(conversation_member::Column::ConversationId.is_in(candidate_ids))
            .all(&self.db)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|m| m.conversation_id)
            .collect();

        if shared.is_empty() {
            return Ok(None);
        }

        let conversation = conversation::Entity::find()
            .filter(conversation::Column::Id.is_in(shared))
            .filter(
                conversation::Column::ConversationType.eq(ConversationType::Private.as_str()),
            )
            .one(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok(conversation)
    }

    /// Create a conversation with its full member set in one transaction.
    ///
    /// The creator is the first member; memberships are inserted in the
    /// order given so the unique (conversation, account) constraint rejects
    /// duplicate member ids.
    pub async fn create_with_members(
        &self,
        conversation_type: ConversationType,
        name: Option<String>,
        member_ids: &[i64],
    ) -> Result<Model, ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let conversation = conversation::ActiveModel {
            conversation_type: Set(conversation_type.as_str().to_string()),
            name: Set(name),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ApiError::from)?;

        for account_id in member_ids {
            conversation_member::ActiveModel {
                conversation_id: Set(conversation.id),
                account_id: Set(*account_id),
                member_type: Set("member".to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ApiError::from)?;
        }

        txn.commit().await.map_err(ApiError::from)?;

        tracing::info!(
            conversation_id = conversation.id,
            members = member_ids.len(),
            "Conversation created"
        );
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_account(db: &DatabaseConnection, name: &str) -> i64 {
        crate::models::account::ActiveModel {
            full_name: Set(name.to_string()),
            email: Set(format!("{name}@example.com")),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn create_with_members_registers_everyone() {
        let db = setup().await;
        let a = insert_account(&db, "alice").await;
        let b = insert_account(&db, "bob").await;
        let repo = ConversationRepository::new(db);

        let conversation = repo
            .create_with_members(ConversationType::Private, None, &[a, b])
            .await
            .unwrap();

        assert!(repo.is_member(conversation.id, a).await.unwrap());
        assert!(repo.is_member(conversation.id, b).await.unwrap());
        assert_eq!(repo.member_conversation_ids(a).await.unwrap(), vec![conversation.id]);
    }

    #[tokio::test]
    async fn find_private_between_ignores_group_conversations() {
        let db = setup().await;
        let a = insert_account(&db, "alice").await;
        let b = insert_account(&db, "bob").await;
        let c = insert_account(&db, "carol").await;
        let repo = ConversationRepository::new(db);

        repo.create_with_members(ConversationType::Group, Some("team".into()), &[a, b, c])
            .await
            .unwrap();
        assert!(repo.find_private_between(a, b).await.unwrap().is_none());

        let private = repo
            .create_with_members(ConversationType::Private, None, &[a, b])
            .await
            .unwrap();
        let found = repo.find_private_between(b, a).await.unwrap().unwrap();
        assert_eq!(found.id, private.id);
    }
}
