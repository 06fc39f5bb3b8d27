//! # Approval Request Repository
//!
//! Read-side queries for approval requests. State transitions happen in the
//! approval service inside a transaction; this type serves the paginated
//! admin listing and the first/last-per-job lookups the workflow rules need.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

use super::PageParams;
use crate::error::{ApiError, not_found};
use crate::models::job;
use crate::models::job_approval_request::{Column, Entity, Model, Relation};
use crate::models::status::ApprovalStatus;

/// Filters accepted by the admin approval-request listing.
#[derive(Debug, Clone, Default)]
pub struct ApprovalRequestFilter {
    pub status: Option<ApprovalStatus>,
    pub business_id: Option<i64>,
}

pub struct ApprovalRequestRepository {
    db: DatabaseConnection,
}

impl ApprovalRequestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find an approval request by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Model>, ApiError> {
        let request = Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find approval request: {}", e);
            ApiError::from(e)
        })?;

        Ok(request)
    }

    /// Find an approval request by id, returning 404 when absent
    pub async fn find_required(&self, id: i64) -> Result<Model, ApiError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Job approval request not found"))
    }

    /// The most recently created request for a job.
    pub async fn last_by_job_id(&self, job_id: i64) -> Result<Option<Model>, ApiError> {
        let request = Entity::find()
            .filter(Column::JobId.eq(job_id))
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(ApiError::from)?;

        Ok(request)
    }

    /// Paginated listing with optional status and owning-business filters.
    pub async fn list(
        &self,
        filter: &ApprovalRequestFilter,
        page: &PageParams,
    ) -> Result<(Vec<Model>, u64), ApiError> {
        let mut query = Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status.as_str()));
        }
        if let Some(business_id) = filter.business_id {
            query = query
                .join(JoinType::InnerJoin, Relation::Job.def())
                .filter(job::Column::BusinessId.eq(business_id));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(ApiError::from)?;

        let sort_column = match page.sort_by.as_deref() {
            Some("id") => Column::Id,
            Some("updated_at") => Column::UpdatedAt,
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
}
