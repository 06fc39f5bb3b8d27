//! # API Handlers
//!
//! HTTP endpoint handlers: the admin approval surface, the business job
//! surface, and the websocket upgrade for chat.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod approval;
pub mod chat;
pub mod jobs;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}
