//! # Approval Log Repository
//!
//! Read-side queries over the append-only audit trail. Rows are written by
//! the approval service inside the same transaction as the transition they
//! record; nothing here ever updates or deletes a row.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::PageParams;
use crate::error::{ApiError, not_found};
use crate::models::job_approval_log::{Column, Entity, Model};

/// Filters accepted by the admin audit-log listing.
#[derive(Debug, Clone, Default)]
pub struct ApprovalLogFilter {
    pub job_id: Option<i64>,
    pub admin_id: Option<i64>,
}

pub struct ApprovalLogRepository {
    db: DatabaseConnection,
}

impl ApprovalLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a log row by id, returning 404 when absent
    pub async fn find_required(&self, id: i64) -> Result<Model, ApiError> {
        Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find approval log: {}", e);
                ApiError::from(e)
            })?
            .ok_or_else(|| not_found("Job approval log not found"))
    }

    /// Paginated listing with optional job and acting-admin filters.
    pub async fn list(
        &self,
        filter: &ApprovalLogFilter,
        page: &PageParams,
    ) -> Result<(Vec<Model>, u64), ApiError> {
        let mut query = Entity::find();
        if let Some(job_id) = filter.job_id {
            query = query.filter(Column::JobId.eq(job_id));
        }
        if let Some(admin_id) = filter.admin_id {
            query = query.filter(Column::AdminId.eq(admin_id));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(ApiError::from)?;

        let sort_column = match page.sort_by.as_deref() {
            Some("id") => Column::Id,
            _ => Column::CreatedAt,
        };
        query = if page.descending() {
            query.order_by_desc(sort_column)
        } else {
            query.order_by_asc(sort_column)
        };

        let rows = query
            .offset(page.skip())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok((rows, total))
    }

    /// Full transition history for one job in creation order.
    pub async fn list_by_job(&self, job_id: i64) -> Result<Vec<Model>, ApiError> {
        let rows = Entity::find()
            .filter(Column::JobId.eq(job_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::LogStatus;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, Set};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_job(db: &DatabaseConnection) -> i64 {
        crate::models::job::ActiveModel {
            business_id: Set(1),
            campaign_id: Set(1),
            title: Set("Barista".to_string()),
            status: Set("pending".to_string()),
            deadline: Set("2026-12-01".parse().unwrap()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn insert_log(db: &DatabaseConnection, job_id: i64, new_status: LogStatus) {
        crate::models::job_approval_log::ActiveModel {
            job_id: Set(job_id),
            admin_id: Set(9),
            previous_status: Set(LogStatus::Pending.as_str().to_string()),
            new_status: Set(new_status.as_str().to_string()),
            reason: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn list_by_job_preserves_append_order() {
        let db = setup().await;
        let job_id = insert_job(&db).await;
        insert_log(&db, job_id, LogStatus::Approved).await;
        insert_log(&db, job_id, LogStatus::Stopped).await;

        let repo = ApprovalLogRepository::new(db);
        let rows = repo.list_by_job(job_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].new_status, "approved");
        assert_eq!(rows[1].new_status, "stopped");
    }

    #[tokio::test]
    async fn list_paginates_and_counts() {
        let db = setup().await;
        let job_id = insert_job(&db).await;
        for _ in 0..3 {
            insert_log(&db, job_id, LogStatus::Approved).await;
        }

        let repo = ApprovalLogRepository::new(db);
        let page = PageParams {
            skip: Some(1),
            limit: Some(1),
            sort_by: Some("id".to_string()),
            order_by: Some("asc".to_string()),
        };
        let filter = ApprovalLogFilter {
            job_id: Some(job_id),
            ..Default::default()
        };
        let (rows, total) = repo.list(&filter, &page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);

        let by_other_admin = ApprovalLogFilter {
            admin_id: Some(1),
            ..Default::default()
        };
        let (rows, total) = repo.list(&by_other_admin, &page).await.unwrap();
        assert_eq!(total, 0);
        assert!(rows.is_empty());
    }
}
