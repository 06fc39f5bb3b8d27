//! # Repositories
//!
//! Repository types encapsulating SeaORM operations per entity. Lookups take
//! explicit foreign keys and return fully-resolved read models; no lazy
//! relationship traversal happens behind attribute access.

pub mod account;
pub mod approval_log;
pub mod approval_request;
pub mod conversation;
pub mod job;
pub mod message;

pub use account::{AccountBasic, AccountRepository};
pub use approval_log::{ApprovalLogFilter, ApprovalLogRepository};
pub use approval_request::{ApprovalRequestFilter, ApprovalRequestRepository};
pub use conversation::ConversationRepository;
pub use job::{JobFieldCollections, JobRepository, JobView};
pub use message::MessageRepository;

use serde::Deserialize;
use utoipa::IntoParams;

/// Common pagination and ordering parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PageParams {
    /// Number of rows to skip (default 0)
    pub skip: Option<u64>,
    /// Maximum number of rows to return (default 20, max 100)
    pub limit: Option<u64>,
    /// Sort column: `id`, `created_at` or `updated_at` (default `created_at`)
    pub sort_by: Option<String>,
    /// Sort direction: `asc` or `desc` (default `desc`)
    pub order_by: Option<String>,
}

impl PageParams {
    pub fn skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).min(100)
    }

    pub fn descending(&self) -> bool {
        !matches!(self.order_by.as_deref(), Some("asc"))
    }
}
