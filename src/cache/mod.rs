//! # Advisory Cache Layer
//!
//! In-process caches for computed job views, validated upload URLs and
//! per-user conversation lists. A miss is never an error, only absence, and
//! every caller goes through [`best_effort`], which logs failures and
//! proceeds with the authoritative store.

use thiserror::Error;

pub mod conversations;
pub mod job_view;
pub mod uploads;

pub use conversations::ConversationListCache;
pub use job_view::{FailingJobViewCache, JobViewCache, LruJobViewCache};
pub use uploads::{FileInfo, UploadCache};

/// Errors a cache backend may surface. Callers must treat these as
/// non-fatal; [`best_effort`] enforces that discipline.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache entry could not be decoded: {0}")]
    Decode(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Resolve a cache result, logging and discarding any failure.
///
/// Returns `None` both on a miss and on a cache error, making the advisory
/// contract explicit at every call site.
pub fn best_effort<T>(operation: &'static str, result: CacheResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                operation,
                error = %err,
                "cache operation failed; continuing with authoritative store"
            );
            metrics::counter!("cache_errors_total", "operation" => operation).increment(1);
            None
        }
    }
}
