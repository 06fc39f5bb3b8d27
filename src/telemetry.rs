//! Tracing setup and request-scoped trace correlation.
//!
//! `init_tracing` installs the global subscriber once per process and
//! routes legacy `log::` macros through it. Every HTTP request runs inside
//! a task-local [`TraceContext`], seeded by the [`trace_requests`]
//! middleware, and its id surfaces on problem+json error bodies.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Correlation id scoped to one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

impl TraceContext {
    /// Honors a caller-supplied `x-request-id`, otherwise mints a fresh id.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let trace_id = headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("req-{}", &uuid::Uuid::new_v4().to_string()[..8]));
        Self { trace_id }
    }
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

/// Errors that can occur while initializing global telemetry.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log tracer bridge: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize global tracing/logging exactly once.
///
/// Failures to claim the global logger or subscriber slots are reported on
/// stderr and otherwise tolerated, so test binaries that already installed
/// either one keep working.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    install_log_bridge();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let fmt_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().json().boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        eprintln!(
            "Warning: failed to set global tracing subscriber: {}. Default subscriber remains in effect.",
            err
        );
    }

    Ok(())
}

/// Route `log::` macros into the tracing pipeline. A `LogTracer` already
/// registered by another init path counts as success.
fn install_log_bridge() {
    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!(
                "Warning: failed to install log tracer bridge: {}. Legacy `log::` macros will not emit structured tracing events.",
                err
            );
        }
    }
}

/// Request middleware seeding the task-local trace context, so errors
/// raised anywhere below the router carry the request's correlation id.
pub async fn trace_requests(request: Request, next: Next) -> Response {
    let context = TraceContext::from_headers(request.headers());
    with_trace_context(context, next.run(request)).await
}

/// Execute `future` with `context` available through task-local storage.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// The trace id of the running task, if one has been seeded.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}
