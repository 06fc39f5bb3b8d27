//! Approval service: job lifecycle transitions and approval-request
//! resolution, executed transactionally per job.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cache::{JobViewCache, best_effort};
use crate::error::{ApiError, forbidden, invalid_state, not_found, validation_error};
use crate::models::status::{ApprovalStatus, JobStatus, LogStatus};
use crate::models::{job, job_approval_log, job_approval_request};
use crate::repositories::job::{JobFieldCollections, replace_field_collections};

/// Input for creating a job. The job is persisted directly; moderation
/// gates publication, not storage.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewJobInput {
    pub campaign_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub employer_verified: bool,
    #[serde(flatten)]
    pub fields: JobFieldCollections,
}

/// Proposed job-field changes carried by an update approval request.
///
/// Scalars are optional (absent means unchanged); field collections are
/// replaced wholesale when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct JobEditPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<JobFieldCollections>,
}

/// Owns the job approval workflow. Holds the pool and the advisory job
/// view cache; each operation opens its own transaction.
pub struct ApprovalService {
    db: DatabaseConnection,
    cache: Arc<dyn JobViewCache>,
}

impl ApprovalService {
    pub fn new(db: DatabaseConnection, cache: Arc<dyn JobViewCache>) -> Self {
        Self { db, cache }
    }

    /// Create a job in PENDING state with its initial approval request.
    pub async fn create_job(
        &self,
        business_id: i64,
        input: NewJobInput,
    ) -> Result<(job::Model, job_approval_request::Model), ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let created = job::ActiveModel {
            business_id: Set(business_id),
            campaign_id: Set(input.campaign_id),
            title: Set(input.title),
            description: Set(input.description),
            status: Set(JobStatus::Pending.as_str().to_string()),
            deadline: Set(input.deadline),
            employer_verified: Set(input.employer_verified),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ApiError::from)?;

        replace_field_collections(&txn, created.id, &input.fields).await?;

        let request = insert_pending_request(&txn, created.id, None).await?;

        txn.commit().await.map_err(ApiError::from)?;

        tracing::info!(job_id = created.id, request_id = request.id, "Job created");
        Ok((created, request))
    }

    /// Submit an edit for an existing job.
    ///
    /// A job that was never live (PENDING, REJECTED, DRAFT, or STOPPED with
    /// a non-approved last resolution) takes the edit immediately and
    /// returns to PENDING. A live or previously-approved job keeps its row
    /// untouched and the edit is parked as the payload of a fresh PENDING
    /// approval request, superseding any still-pending one.
    pub async fn submit_edit(
        &self,
        business_id: i64,
        job_id: i64,
        payload: JobEditPayload,
    ) -> Result<job::Model, ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let current = find_job(&txn, job_id).await?;

        if current.business_id != business_id {
            return Err(forbidden(None));
        }

        let status: JobStatus = current.status.parse()?;
        let moderated = match status {
            JobStatus::Published => true,
            JobStatus::Stopped => {
                let last = last_request(&txn, job_id).await?;
                matches!(
                    last.as_ref().map(|r| r.status.as_str()),
                    Some(s) if s == ApprovalStatus::Approved.as_str()
                )
            }
            JobStatus::Banned => return Err(invalid_state("Invalid status")),
            _ => false,
        };

        let updated = if moderated {
            let data = serde_json::to_value(&payload)
                .map_err(|e| validation_error("Invalid edit payload", serde_json::json!(e.to_string())))?;
            delete_pending_requests(&txn, job_id).await?;
            insert_pending_request(&txn, job_id, Some(data)).await?;
            current
        } else {
            let updated = apply_edit(&txn, current, &payload).await?;
            let updated = set_job_status(&txn, updated, JobStatus::Pending).await?;
            if status != JobStatus::Stopped {
                // Keep exactly one fresh pending request so the edit stays
                // approvable through the normal path.
                delete_pending_requests(&txn, job_id).await?;
                insert_pending_request(&txn, job_id, None).await?;
            }
            updated
        };

        txn.commit().await.map_err(ApiError::from)?;

        best_effort("invalidate", self.cache.invalidate(job_id));
        tracing::info!(job_id, moderated, "Job edit submitted");
        Ok(updated)
    }

    /// Resolve the initial approval request of a PENDING job.
    pub async fn approve(
        &self,
        admin_id: i64,
        request_id: i64,
        outcome: ApprovalStatus,
        reason: Option<String>,
    ) -> Result<job_approval_request::Model, ApiError> {
        if !matches!(outcome, ApprovalStatus::Approved | ApprovalStatus::Rejected) {
            return Err(invalid_state("Invalid status"));
        }

        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let request = find_request(&txn, request_id).await?;
        let current = find_job(&txn, request.job_id).await?;
        let job_status: JobStatus = current.status.parse()?;

        if job_status != JobStatus::Pending {
            return Err(invalid_state("Invalid status"));
        }

        let job_id = current.id;
        let new_job_status = match outcome {
            ApprovalStatus::Approved => JobStatus::Published,
            _ => JobStatus::Rejected,
        };
        set_job_status(&txn, current, new_job_status).await?;
        let resolved = set_request_status(&txn, request, outcome).await?;
        append_log(
            &txn,
            job_id,
            admin_id,
            LogStatus::Pending,
            LogStatus::from(outcome),
            reason,
        )
        .await?;

        txn.commit().await.map_err(ApiError::from)?;

        best_effort("invalidate", self.cache.invalidate(job_id));
        metrics::counter!("approval_resolutions_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(job_id, request_id, outcome = outcome.as_str(), "Approval resolved");
        Ok(resolved)
    }

    /// Resolve a non-initial approval request: a resubmission or a stop.
    pub async fn approve_update(
        &self,
        admin_id: i64,
        request_id: i64,
        outcome: ApprovalStatus,
        reason: Option<String>,
    ) -> Result<job_approval_request::Model, ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let request = find_request(&txn, request_id).await?;
        let current = find_job(&txn, request.job_id).await?;
        let job_status: JobStatus = current.status.parse()?;
        let request_status: ApprovalStatus = request.status.parse()?;
        let job_id = current.id;

        if outcome == ApprovalStatus::Stopped {
            if job_status != JobStatus::Published {
                return Err(invalid_state("Invalid status"));
            }
            set_job_status(&txn, current, JobStatus::Stopped).await?;
            let resolved = if request_status == ApprovalStatus::Pending {
                set_request_status(&txn, request, ApprovalStatus::Stopped).await?
            } else {
                request
            };
            append_log(
                &txn,
                job_id,
                admin_id,
                LogStatus::Published,
                LogStatus::Stopped,
                reason,
            )
            .await?;
            txn.commit().await.map_err(ApiError::from)?;
            best_effort("invalidate", self.cache.invalidate(job_id));
            metrics::counter!("approval_resolutions_total", "outcome" => "stopped").increment(1);
            tracing::info!(job_id, request_id, "Job stopped");
            return Ok(resolved);
        }

        if request_status == outcome {
            return Err(invalid_state("Job already approved"));
        }
        if request_status != ApprovalStatus::Pending {
            return Err(invalid_state("Invalid status"));
        }

        if outcome == ApprovalStatus::Approved {
            if let Some(data) = request.data.clone() {
                let payload: JobEditPayload = serde_json::from_value(data).map_err(|e| {
                    validation_error("Invalid edit payload", serde_json::json!(e.to_string()))
                })?;
                apply_edit(&txn, current, &payload).await?;
            }
        }

        let resolved = set_request_status(&txn, request, outcome).await?;
        append_log(
            &txn,
            job_id,
            admin_id,
            LogStatus::Pending,
            LogStatus::from(outcome),
            reason,
        )
        .await?;

        txn.commit().await.map_err(ApiError::from)?;

        best_effort("invalidate", self.cache.invalidate(job_id));
        metrics::counter!("approval_resolutions_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(job_id, request_id, outcome = outcome.as_str(), "Update resolved");
        Ok(resolved)
    }
}

// Transition transactions read with `FOR UPDATE` so two concurrent
// resolutions of one request serialize and the loser fails its status
// precondition instead of overwriting the winner. Sqlite drops the lock
// clause from the generated SQL and serializes writers itself.
async fn find_request(
    txn: &DatabaseTransaction,
    id: i64,
) -> Result<job_approval_request::Model, ApiError> {
    job_approval_request::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| not_found("Job approval request not found"))
}

async fn find_job(txn: &DatabaseTransaction, id: i64) -> Result<job::Model, ApiError> {
    job::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| not_found("Job not found"))
}

async fn last_request(
    txn: &DatabaseTransaction,
    job_id: i64,
) -> Result<Option<job_approval_request::Model>, ApiError> {
    let row = job_approval_request::Entity::find()
        .filter(job_approval_request::Column::JobId.eq(job_id))
        .order_by_desc(job_approval_request::Column::Id)
        .one(txn)
        .await
        .map_err(ApiError::from)?;
    Ok(row)
}

async fn delete_pending_requests(txn: &DatabaseTransaction, job_id: i64) -> Result<(), ApiError> {
    job_approval_request::Entity::delete_many()
        .filter(job_approval_request::Column::JobId.eq(job_id))
        .filter(job_approval_request::Column::Status.eq(ApprovalStatus::Pending.as_str()))
        .exec(txn)
        .await
        .map_err(ApiError::from)?;
    Ok(())
}

async fn insert_pending_request(
    txn: &DatabaseTransaction,
    job_id: i64,
    data: Option<serde_json::Value>,
) -> Result<job_approval_request::Model, ApiError> {
    let request = job_approval_request::ActiveModel {
        job_id: Set(job_id),
        status: Set(ApprovalStatus::Pending.as_str().to_string()),
        data: Set(data),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ApiError::from)?;
    Ok(request)
}

async fn set_job_status(
    txn: &DatabaseTransaction,
    current: job::Model,
    status: JobStatus,
) -> Result<job::Model, ApiError> {
    let mut active: job::ActiveModel = current.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now().fixed_offset());
    let updated = active.update(txn).await.map_err(ApiError::from)?;
    Ok(updated)
}

async fn set_request_status(
    txn: &DatabaseTransaction,
    request: job_approval_request::Model,
    status: ApprovalStatus,
) -> Result<job_approval_request::Model, ApiError> {
    let mut active: job_approval_request::ActiveModel = request.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now().fixed_offset());
    let updated = active.update(txn).await.map_err(ApiError::from)?;
    Ok(updated)
}

async fn append_log(
    txn: &DatabaseTransaction,
    job_id: i64,
    admin_id: i64,
    previous: LogStatus,
    new: LogStatus,
    reason: Option<String>,
) -> Result<(), ApiError> {
    job_approval_log::ActiveModel {
        job_id: Set(job_id),
        admin_id: Set(admin_id),
        previous_status: Set(previous.as_str().to_string()),
        new_status: Set(new.as_str().to_string()),
        reason: Set(reason),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ApiError::from)?;
    Ok(())
}

async fn apply_edit<C: ConnectionTrait>(
    conn: &C,
    current: job::Model,
    payload: &JobEditPayload,
) -> Result<job::Model, ApiError> {
    let job_id = current.id;
    let mut active: job::ActiveModel = current.into();
    if let Some(title) = &payload.title {
        active.title = Set(title.clone());
    }
    if let Some(description) = &payload.description {
        active.description = Set(Some(description.clone()));
    }
    if let Some(deadline) = payload.deadline {
        active.deadline = Set(deadline);
    }
    active.updated_at = Set(chrono::Utc::now().fixed_offset());
    let updated = active.update(conn).await.map_err(ApiError::from)?;

    if let Some(fields) = &payload.fields {
        replace_field_collections(conn, job_id, fields).await?;
    }

    Ok(updated)
}
