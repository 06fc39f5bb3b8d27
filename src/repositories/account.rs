//! # Account Repository
//!
//! Lookup operations for accounts plus the basic profile read model exposed
//! on chat events.

use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, not_found};
use crate::models::account::{Entity, Model};

/// Basic account profile attached to outbound chat events.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountBasic {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: String,
    pub type_account: String,
}

impl From<Model> for AccountBasic {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            avatar: model.avatar,
            role: model.role,
            type_account: model.type_account,
        }
    }
}

/// Repository for account lookups
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find an account by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Model>, ApiError> {
        let account = Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find account: {}", e);
            ApiError::from(e)
        })?;

        Ok(account)
    }

    /// Find an account by id, returning 404 when absent
    pub async fn find_required(&self, id: i64) -> Result<Model, ApiError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found(&format!("Account {} not found", id)))
    }

    /// Load several accounts at once, erroring on the first missing id
    pub async fn find_all_required(&self, ids: &[i64]) -> Result<Vec<Model>, ApiError> {
        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            accounts.push(self.find_required(*id).await?);
        }
        Ok(accounts)
    }
}
