//! # Job API Handlers
//!
//! Business-facing endpoints: create a job (which opens moderation),
//! submit an edit, and read the cached job view.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::approval::{JobEditPayload, NewJobInput};
use crate::auth::CurrentAccount;
use crate::cache::best_effort;
use crate::error::{ApiError, forbidden};
use crate::handlers::approval::{ApprovalLogInfo, ApprovalRequestInfo};
use crate::models::job;
use crate::repositories::{
    ApprovalLogRepository, ApprovalRequestRepository, JobRepository, JobView,
};
use crate::server::AppState;

/// Job row as exposed on the API (scalar fields only)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    pub id: i64,
    pub business_id: i64,
    pub campaign_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub deadline: String,
    pub employer_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<job::Model> for JobInfo {
    fn from(model: job::Model) -> Self {
        Self {
            id: model.id,
            business_id: model.business_id,
            campaign_id: model.campaign_id,
            title: model.title,
            description: model.description,
            status: model.status,
            deadline: model.deadline.to_string(),
            employer_verified: model.employer_verified,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Response of job creation: the job plus its initial approval request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedJobResponse {
    pub job: JobInfo,
    pub approval_request: ApprovalRequestInfo,
}

/// Creates a job in pending state and opens moderation
#[utoipa::path(
    post,
    path = "/business/jobs",
    request_body = NewJobInput,
    responses(
        (status = 200, description = "Created job with its approval request", body = CreatedJobResponse),
        (status = 403, description = "Caller is not a business account", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Json(body): Json<NewJobInput>,
) -> Result<Json<CreatedJobResponse>, ApiError> {
    caller.require_business()?;

    let (created, request) = state.approval.create_job(caller.id(), body).await?;
    Ok(Json(CreatedJobResponse {
        job: created.into(),
        approval_request: request.into(),
    }))
}

/// Submits an edit for an existing job
#[utoipa::path(
    put,
    path = "/business/jobs/{id}",
    params(("id" = i64, Path, description = "Job id")),
    request_body = JobEditPayload,
    responses(
        (status = 200, description = "Job after the edit was applied or parked", body = JobInfo),
        (status = 403, description = "Caller does not own the job", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn edit_job(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<i64>,
    Json(body): Json<JobEditPayload>,
) -> Result<Json<JobInfo>, ApiError> {
    caller.require_business()?;

    let updated = state.approval.submit_edit(caller.id(), id, body).await?;
    Ok(Json(updated.into()))
}

/// Job detail: the resolved view plus its current moderation state
#[derive(Debug, Serialize, ToSchema)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub view: JobView,
    /// Most recent approval request, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_request: Option<ApprovalRequestInfo>,
    /// Full transition history
    pub approval_logs: Vec<ApprovalLogInfo>,
}

/// Fetches the job detail; the view part is served from cache when warm
#[utoipa::path(
    get,
    path = "/business/jobs/{id}",
    params(("id" = i64, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job detail", body = JobDetailResponse),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<i64>,
) -> Result<Json<JobDetailResponse>, ApiError> {
    let view = match best_effort("get", state.job_cache.get(id)) {
        Some(Some(view)) => view,
        _ => {
            let repo = JobRepository::new(state.db.clone());
            let row = repo.find_required(id).await?;
            let view = repo.view(row).await?;
            best_effort("put", state.job_cache.put(view.clone()));
            view
        }
    };
    authorize_view(&caller, view.business_id)?;

    let approval_request = ApprovalRequestRepository::new(state.db.clone())
        .last_by_job_id(id)
        .await?
        .map(ApprovalRequestInfo::from);
    let approval_logs = ApprovalLogRepository::new(state.db.clone())
        .list_by_job(id)
        .await?
        .into_iter()
        .map(ApprovalLogInfo::from)
        .collect();

    Ok(Json(JobDetailResponse {
        view,
        approval_request,
        approval_logs,
    }))
}

fn authorize_view(caller: &CurrentAccount, business_id: i64) -> Result<(), ApiError> {
    if caller.is_admin() || caller.id() == business_id {
        Ok(())
    } else {
        Err(forbidden(None))
    }
}
