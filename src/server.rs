//! # Server Configuration
//!
//! Router assembly, shared application state, and the OpenAPI document.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::approval::ApprovalService;
use crate::cache::{ConversationListCache, JobViewCache, LruJobViewCache, UploadCache};
use crate::chat::{ChatService, ConnectionRegistry};
use crate::config::AppConfig;
use crate::handlers;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub approval: Arc<ApprovalService>,
    pub chat: Arc<ChatService>,
    pub job_cache: Arc<dyn JobViewCache>,
}

impl AppState {
    /// Wires every component from the pool and configuration.
    pub fn build(config: AppConfig, db: DatabaseConnection) -> Self {
        let config = Arc::new(config);
        let job_cache: Arc<dyn JobViewCache> = Arc::new(LruJobViewCache::new(
            config.cache.job_view_capacity,
            Duration::from_secs(config.cache.search_ttl_seconds),
        ));
        let uploads = Arc::new(UploadCache::new(Duration::from_secs(
            config.cache.upload_ttl_seconds,
        )));
        let conversation_cache = Arc::new(ConversationListCache::new());
        let registry = Arc::new(ConnectionRegistry::new());

        let approval = Arc::new(ApprovalService::new(db.clone(), job_cache.clone()));
        let chat = Arc::new(ChatService::new(
            db.clone(),
            registry,
            uploads,
            conversation_cache,
            config.chat.message_max_len,
        ));

        Self {
            db,
            config,
            approval,
            chat,
            job_cache,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/ws", get(handlers::chat::ws_upgrade))
        .route(
            "/admin/job-approval-requests",
            get(handlers::approval::list_requests),
        )
        .route(
            "/admin/job-approval-requests/approve",
            post(handlers::approval::approve),
        )
        .route(
            "/admin/job-approval-requests/{id}",
            get(handlers::approval::get_request),
        )
        .route(
            "/admin/job-approval-requests/{id}/approve-update",
            put(handlers::approval::approve_update),
        )
        .route(
            "/admin/job-approval-logs",
            get(handlers::approval::list_logs),
        )
        .route(
            "/admin/job-approval-logs/{id}",
            get(handlers::approval::get_log),
        )
        .route("/business/jobs", post(handlers::jobs::create_job))
        .route(
            "/business/jobs/{id}",
            get(handlers::jobs::get_job).put(handlers::jobs::edit_job),
        )
        .layer(axum::middleware::from_fn(
            crate::telemetry::trace_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::build(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::chat::ws_upgrade,
        crate::handlers::approval::list_requests,
        crate::handlers::approval::get_request,
        crate::handlers::approval::approve,
        crate::handlers::approval::approve_update,
        crate::handlers::approval::list_logs,
        crate::handlers::approval::get_log,
        crate::handlers::jobs::create_job,
        crate::handlers::jobs::edit_job,
        crate::handlers::jobs::get_job,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::approval::ApprovalRequestInfo,
            crate::handlers::approval::ApprovalLogInfo,
            crate::handlers::approval::PagedResponse<crate::handlers::approval::ApprovalRequestInfo>,
            crate::handlers::approval::PagedResponse<crate::handlers::approval::ApprovalLogInfo>,
            crate::handlers::approval::ApproveBody,
            crate::handlers::approval::ApproveUpdateBody,
            crate::handlers::jobs::JobInfo,
            crate::handlers::jobs::CreatedJobResponse,
            crate::handlers::jobs::JobDetailResponse,
            crate::approval::NewJobInput,
            crate::approval::JobEditPayload,
            crate::repositories::JobView,
            crate::repositories::JobFieldCollections,
            crate::repositories::AccountBasic,
        )
    ),
    info(
        title = "Jobmarket Core API",
        description = "Job approval workflow and real-time chat",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
