//! # Approval API Handlers
//!
//! Admin-facing endpoints over the job approval workflow: paginated
//! listings of requests and audit logs, and the two resolution actions.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::CurrentAccount;
use crate::error::{ApiError, invalid_state};
use crate::models::status::ApprovalStatus;
use crate::models::{job_approval_log, job_approval_request};
use crate::repositories::{
    ApprovalLogFilter, ApprovalLogRepository, ApprovalRequestFilter, ApprovalRequestRepository,
    PageParams,
};
use crate::server::AppState;

/// Approval request as exposed on the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRequestInfo {
    pub id: i64,
    pub job_id: i64,
    pub status: String,
    /// Proposed field changes for update requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<job_approval_request::Model> for ApprovalRequestInfo {
    fn from(model: job_approval_request::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            status: model.status,
            data: model.data,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Audit log row as exposed on the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalLogInfo {
    pub id: i64,
    pub job_id: i64,
    pub admin_id: i64,
    pub previous_status: String,
    pub new_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<job_approval_log::Model> for ApprovalLogInfo {
    fn from(model: job_approval_log::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            admin_id: model.admin_id,
            previous_status: model.previous_status,
            new_status: model.new_status,
            reason: model.reason,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Extra filters for the approval request listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRequestsQuery {
    /// Filter by request status (lowercase)
    pub status: Option<String>,
    /// Filter by owning business account id
    pub business_id: Option<i64>,
}

/// Paginated listing envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Body of the approve action
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveBody {
    pub job_approval_request_id: i64,
    /// Requested outcome: `approved` or `rejected`
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of the approve-update action
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveUpdateBody {
    /// Requested outcome: `approved`, `rejected` or `stopped`
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Lists approval requests with optional status and business filters
#[utoipa::path(
    get,
    path = "/admin/job-approval-requests",
    params(PageParams, ListRequestsQuery),
    responses(
        (status = 200, description = "Paginated approval requests", body = PagedResponse<ApprovalRequestInfo>),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "approval"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(page): Query<PageParams>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<PagedResponse<ApprovalRequestInfo>>, ApiError> {
    caller.require_admin()?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApprovalStatus>)
        .transpose()
        .map_err(|_| invalid_state("Invalid status"))?;
    let filter = ApprovalRequestFilter {
        status,
        business_id: query.business_id,
    };

    let repo = ApprovalRequestRepository::new(state.db.clone());
    let (rows, total) = repo.list(&filter, &page).await?;

    Ok(Json(PagedResponse {
        items: rows.into_iter().map(ApprovalRequestInfo::from).collect(),
        total,
    }))
}

/// Fetches a single approval request by id
#[utoipa::path(
    get,
    path = "/admin/job-approval-requests/{id}",
    params(("id" = i64, Path, description = "Approval request id")),
    responses(
        (status = 200, description = "Approval request", body = ApprovalRequestInfo),
        (status = 404, description = "Not found", body = ApiError)
    ),
    tag = "approval"
)]
pub async fn get_request(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<i64>,
) -> Result<Json<ApprovalRequestInfo>, ApiError> {
    caller.require_admin()?;

    let repo = ApprovalRequestRepository::new(state.db.clone());
    let row = repo.find_required(id).await?;
    Ok(Json(row.into()))
}

/// Resolves the initial approval request of a pending job
#[utoipa::path(
    post,
    path = "/admin/job-approval-requests/approve",
    request_body = ApproveBody,
    responses(
        (status = 200, description = "Updated approval request", body = ApprovalRequestInfo),
        (status = 400, description = "Invalid status transition", body = ApiError),
        (status = 404, description = "Request not found", body = ApiError)
    ),
    tag = "approval"
)]
pub async fn approve(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Json(body): Json<ApproveBody>,
) -> Result<Json<ApprovalRequestInfo>, ApiError> {
    caller.require_admin()?;

    let outcome: ApprovalStatus = body
        .status
        .parse()
        .map_err(|_| invalid_state("Invalid status"))?;
    let resolved = state
        .approval
        .approve(caller.id(), body.job_approval_request_id, outcome, body.reason)
        .await?;
    Ok(Json(resolved.into()))
}

/// Resolves a resubmission or stop request
#[utoipa::path(
    put,
    path = "/admin/job-approval-requests/{id}/approve-update",
    params(("id" = i64, Path, description = "Approval request id")),
    request_body = ApproveUpdateBody,
    responses(
        (status = 200, description = "Updated approval request", body = ApprovalRequestInfo),
        (status = 400, description = "Invalid status transition", body = ApiError),
        (status = 404, description = "Request not found", body = ApiError)
    ),
    tag = "approval"
)]
pub async fn approve_update(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<i64>,
    Json(body): Json<ApproveUpdateBody>,
) -> Result<Json<ApprovalRequestInfo>, ApiError> {
    caller.require_admin()?;

    let outcome: ApprovalStatus = body
        .status
        .parse()
        .map_err(|_| invalid_state("Invalid status"))?;
    let resolved = state
        .approval
        .approve_update(caller.id(), id, outcome, body.reason)
        .await?;
    Ok(Json(resolved.into()))
}

/// Extra filters for the audit log listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLogsQuery {
    /// Restrict to one job
    pub job_id: Option<i64>,
    /// Restrict to one acting admin
    pub admin_id: Option<i64>,
}

/// Lists approval log rows
#[utoipa::path(
    get,
    path = "/admin/job-approval-logs",
    params(PageParams, ListLogsQuery),
    responses(
        (status = 200, description = "Paginated audit log", body = PagedResponse<ApprovalLogInfo>)
    ),
    tag = "approval"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(page): Query<PageParams>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<PagedResponse<ApprovalLogInfo>>, ApiError> {
    caller.require_admin()?;

    let filter = ApprovalLogFilter {
        job_id: query.job_id,
        admin_id: query.admin_id,
    };
    let repo = ApprovalLogRepository::new(state.db.clone());
    let (rows, total) = repo.list(&filter, &page).await?;
    Ok(Json(PagedResponse {
        items: rows.into_iter().map(ApprovalLogInfo::from).collect(),
        total,
    }))
}

/// Fetches a single audit log row by id
#[utoipa::path(
    get,
    path = "/admin/job-approval-logs/{id}",
    params(("id" = i64, Path, description = "Approval log id")),
    responses(
        (status = 200, description = "Audit log row", body = ApprovalLogInfo),
        (status = 404, description = "Not found", body = ApiError)
    ),
    tag = "approval"
)]
pub async fn get_log(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<i64>,
) -> Result<Json<ApprovalLogInfo>, ApiError> {
    caller.require_admin()?;

    let row = ApprovalLogRepository::new(state.db.clone())
        .find_required(id)
        .await?;
    Ok(Json(row.into()))
}
