//! # Job Repository
//!
//! Job lookups, the fully-resolved `JobView` read model, scheduled expiry,
//! and replace-all-by-job-id semantics for the job field collections used
//! when an approved edit payload is applied.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, not_found};
use crate::models::job::{Column, Entity, Model};
use crate::models::status::JobStatus;
use crate::models::{job_category, job_location, job_skill, job_working_time};

/// A work-location entry in a job's field collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationEntry {
    pub province_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<i64>,
}

/// A working-time entry ("08:00"–"17:30").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkingTimeEntry {
    pub start_time: String,
    pub end_time: String,
}

/// The job field collections replaced wholesale on every applied edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobFieldCollections {
    #[serde(default)]
    pub must_have_skills: Vec<i64>,
    #[serde(default)]
    pub should_have_skills: Vec<i64>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub working_times: Vec<WorkingTimeEntry>,
}

/// Fully-resolved job read model, the unit stored in the job view cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobView {
    pub id: i64,
    pub business_id: i64,
    pub campaign_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: JobStatus,
    pub deadline: NaiveDate,
    pub employer_verified: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub fields: JobFieldCollections,
}

/// Repository for job database operations
pub struct JobRepository {
    db: DatabaseConnection,
}

impl JobRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a job by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Model>, ApiError> {
        let job = Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find job: {}", e);
            ApiError::from(e)
        })?;

        Ok(job)
    }

    /// Find a job by id, returning 404 when absent
    pub async fn find_required(&self, id: i64) -> Result<Model, ApiError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Job not found"))
    }

    /// Assemble the fully-resolved read model for a job row.
    pub async fn view(&self, job: Model) -> Result<JobView, ApiError> {
        let fields = load_field_collections(&self.db, job.id).await?;
        let status: JobStatus = job.status.parse()?;

        Ok(JobView {
            id: job.id,
            business_id: job.business_id,
            campaign_id: job.campaign_id,
            title: job.title,
            description: job.description,
            status,
            deadline: job.deadline,
            employer_verified: job.employer_verified,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            fields,
        })
    }

    /// Flip published jobs past their deadline to `expired`.
    ///
    /// Invoked by an external scheduler; returns the number of jobs expired.
    pub async fn expire_overdue(&self, today: NaiveDate) -> Result<u64, ApiError> {
        let result = Entity::update_many()
            .col_expr(Column::Status, JobStatus::Expired.as_str().into())
            .filter(Column::Status.eq(JobStatus::Published.as_str()))
            .filter(Column::Deadline.lt(today))
            .exec(&self.db)
            .await
            .map_err(ApiError::from)?;

        if result.rows_affected > 0 {
            tracing::info!(expired = result.rows_affected, "Expired overdue jobs");
        }
        Ok(result.rows_affected)
    }

}

/// Load the field collections for a job with explicit per-table queries.
pub async fn load_field_collections<C: ConnectionTrait>(
    conn: &C,
    job_id: i64,
) -> Result<JobFieldCollections, ApiError> {
    let skills = job_skill::Entity::find()
        .filter(job_skill::Column::JobId.eq(job_id))
        .order_by_asc(job_skill::Column::Id)
        .all(conn)
        .await
        .map_err(ApiError::from)?;

    let locations = job_location::Entity::find()
        .filter(job_location::Column::JobId.eq(job_id))
        .order_by_asc(job_location::Column::Id)
        .all(conn)
        .await
        .map_err(ApiError::from)?;

    let categories = job_category::Entity::find()
        .filter(job_category::Column::JobId.eq(job_id))
        .order_by_asc(job_category::Column::Id)
        .all(conn)
        .await
        .map_err(ApiError::from)?;

    let working_times = job_working_time::Entity::find()
        .filter(job_working_time::Column::JobId.eq(job_id))
        .order_by_asc(job_working_time::Column::Id)
        .all(conn)
        .await
        .map_err(ApiError::from)?;

    Ok(JobFieldCollections {
        must_have_skills: skills
            .iter()
            .filter(|s| s.kind == "must_have")
            .map(|s| s.skill_id)
            .collect(),
        should_have_skills: skills
            .iter()
            .filter(|s| s.kind == "should_have")
            .map(|s| s.skill_id)
            .collect(),
        locations: locations
            .into_iter()
            .map(|l| LocationEntry {
                province_id: l.province_id,
                district_id: l.district_id,
            })
            .collect(),
        categories: categories.into_iter().map(|c| c.category_id).collect(),
        working_times: working_times
            .into_iter()
            .map(|w| WorkingTimeEntry {
                start_time: w.start_time,
                end_time: w.end_time,
            })
            .collect(),
    })
}

/// Replace all field-collection rows for a job inside the caller's
/// transaction. Delete-then-insert per table; the caller commits.
pub async fn replace_field_collections<C: ConnectionTrait>(
    conn: &C,
    job_id: i64,
    fields: &JobFieldCollections,
) -> Result<(), ApiError> {
    job_skill::Entity::delete_many()
        .filter(job_skill::Column::JobId.eq(job_id))
        .exec(conn)
        .await
        .map_err(ApiError::from)?;

    job_location::Entity::delete_many()
        .filter(job_location::Column::JobId.eq(job_id))
        .exec(conn)
        .await
        .map_err(ApiError::from)?;

    job_category::Entity::delete_many()
        .filter(job_category::Column::JobId.eq(job_id))
        .exec(conn)
        .await
        .map_err(ApiError::from)?;

    job_working_time::Entity::delete_many()
        .filter(job_working_time::Column::JobId.eq(job_id))
        .exec(conn)
        .await
        .map_err(ApiError::from)?;

    for (skills, kind) in [
        (&fields.must_have_skills, "must_have"),
        (&fields.should_have_skills, "should_have"),
    ] {
        for skill_id in skills {
            job_skill::ActiveModel {
                job_id: Set(job_id),
                skill_id: Set(*skill_id),
                kind: Set(kind.to_string()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(ApiError::from)?;
        }
    }

    for location in &fields.locations {
        job_location::ActiveModel {
            job_id: Set(job_id),
            province_id: Set(location.province_id),
            district_id: Set(location.district_id),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ApiError::from)?;
    }

    for category_id in &fields.categories {
        job_category::ActiveModel {
            job_id: Set(job_id),
            category_id: Set(*category_id),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ApiError::from)?;
    }

    for working_time in &fields.working_times {
        job_working_time::ActiveModel {
            job_id: Set(job_id),
            start_time: Set(working_time.start_time.clone()),
            end_time: Set(working_time.end_time.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ApiError::from)?;
    }

    Ok(())
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

    async fn insert_job(db: &DatabaseConnection, status: JobStatus, deadline: &str) -> Model {
        crate::models::job::ActiveModel {
            business_id: Set(1),
            campaign_id: Set(1),
            title: Set("Backend engineer".to_string()),
            description: Set(None),
            status: Set(status.as_str().to_string()),
            deadline: Set(deadline.parse().unwrap()),
            employer_verified: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn replace_field_collections_is_wholesale() {
        let db = setup().await;
        let job = insert_job(&db, JobStatus::Pending, "2026-12-01").await;

        let first = JobFieldCollections {
            must_have_skills: vec![1, 2],
            categories: vec![10],
            ..Default::default()
        };
        replace_field_collections(&db, job.id, &first).await.unwrap();

        let second = JobFieldCollections {
            must_have_skills: vec![3],
            should_have_skills: vec![4],
            ..Default::default()
        };
        replace_field_collections(&db, job.id, &second).await.unwrap();

        let loaded = load_field_collections(&db, job.id).await.unwrap();
        assert_eq!(loaded.must_have_skills, vec![3]);
        assert_eq!(loaded.should_have_skills, vec![4]);
        assert!(loaded.categories.is_empty());
    }

    #[tokio::test]
    async fn expire_overdue_only_touches_published_jobs() {
        let db = setup().await;
        let repo = JobRepository::new(db.clone());

        let published = insert_job(&db, JobStatus::Published, "2026-01-01").await;
        let pending = insert_job(&db, JobStatus::Pending, "2026-01-01").await;
        let fresh = insert_job(&db, JobStatus::Published, "2026-12-31").await;

        let expired = repo.expire_overdue("2026-06-01".parse().unwrap()).await.unwrap();
        assert_eq!(expired, 1);

        let reloaded = repo.find_required(published.id).await.unwrap();
        assert_eq!(reloaded.status, "expired");
        assert_eq!(repo.find_required(pending.id).await.unwrap().status, "pending");
        assert_eq!(repo.find_required(fresh.id).await.unwrap().status, "published");
    }

    #[tokio::test]
    async fn view_resolves_collections_and_status() {
        let db = setup().await;
        let repo = JobRepository::new(db.clone());
        let job = insert_job(&db, JobStatus::Published, "2026-12-01").await;

        let fields = JobFieldCollections {
            locations: vec![LocationEntry {
                province_id: 7,
                district_id: None,
            }],
            ..Default::default()
        };
        replace_field_collections(&db, job.id, &fields).await.unwrap();

        let view = repo.view(job).await.unwrap();
        assert_eq!(view.status, JobStatus::Published);
        assert_eq!(view.fields.locations.len(), 1);
    }
}
