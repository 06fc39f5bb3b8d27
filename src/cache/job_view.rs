//! Job view cache.
//!
//! Caches fully-resolved [`JobView`] read models by job id and serialized
//! search results by query fingerprint. Status transitions invalidate the
//! per-job entry and clear the search namespace.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::{CacheError, CacheResult};
use crate::repositories::JobView;

/// Backend-agnostic cache interface for job read models.
///
/// All methods return `CacheResult` so a remote backend can surface
/// transport failures; callers resolve them through
/// [`best_effort`](super::best_effort).
pub trait JobViewCache: Send + Sync {
    fn get(&self, job_id: i64) -> CacheResult<Option<JobView>>;
    fn put(&self, view: JobView) -> CacheResult<()>;
    /// Drop the entry for one job and every cached search result.
    fn invalidate(&self, job_id: i64) -> CacheResult<()>;
    fn get_search(&self, fingerprint: &str) -> CacheResult<Option<String>>;
    fn put_search(&self, fingerprint: &str, payload: String) -> CacheResult<()>;
}

struct SearchEntry {
    payload: String,
    stored_at: Instant,
}

struct Inner {
    views: LruCache<i64, JobView>,
    searches: HashMap<String, SearchEntry>,
}

/// In-process implementation backed by an LRU map for job views and a
/// TTL'd map for search results.
pub struct LruJobViewCache {
    inner: Mutex<Inner>,
    search_ttl: Duration,
}

impl LruJobViewCache {
    pub fn new(capacity: usize, search_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                views: LruCache::new(capacity),
                searches: HashMap::new(),
            }),
            search_ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a holder panicked; the maps stay
        // structurally valid, so recover the guard.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JobViewCache for LruJobViewCache {
    fn get(&self, job_id: i64) -> CacheResult<Option<JobView>> {
        Ok(self.lock().views.get(&job_id).cloned())
    }

    fn put(&self, view: JobView) -> CacheResult<()> {
        self.lock().views.put(view.id, view);
        Ok(())
    }

    fn invalidate(&self, job_id: i64) -> CacheResult<()> {
        let mut inner = self.lock();
        inner.views.pop(&job_id);
        inner.searches.clear();
        Ok(())
    }

    fn get_search(&self, fingerprint: &str) -> CacheResult<Option<String>> {
        let mut inner = self.lock();
        match inner.searches.get(fingerprint) {
            Some(entry) if entry.stored_at.elapsed() < self.search_ttl => {
                Ok(Some(entry.payload.clone()))
            }
            Some(_) => {
                inner.searches.remove(fingerprint);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put_search(&self, fingerprint: &str, payload: String) -> CacheResult<()> {
        self.lock().searches.insert(
            fingerprint.to_string(),
            SearchEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }
}

/// Cache double that fails every operation. Used in tests to show the
/// service paths survive a dead cache backend.
pub struct FailingJobViewCache;

impl JobViewCache for FailingJobViewCache {
    fn get(&self, _job_id: i64) -> CacheResult<Option<JobView>> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn put(&self, _view: JobView) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn invalidate(&self, _job_id: i64) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn get_search(&self, _fingerprint: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn put_search(&self, _fingerprint: &str, _payload: String) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::JobStatus;
    use crate::repositories::job::JobFieldCollections;

    fn sample_view(id: i64) -> JobView {
        JobView {
            id,
            business_id: 1,
            campaign_id: 1,
            title: "Warehouse operator".to_string(),
            description: None,
            status: JobStatus::Published,
            deadline: "2026-12-01".parse().unwrap(),
            employer_verified: true,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
            fields: JobFieldCollections::default(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = LruJobViewCache::new(8, Duration::from_secs(60));
        cache.put(sample_view(1)).unwrap();
        let hit = cache.get(1).unwrap().unwrap();
        assert_eq!(hit.title, "Warehouse operator");
        assert!(cache.get(2).unwrap().is_none());
    }

    #[test]
    fn invalidate_clears_job_and_search_namespace() {
        let cache = LruJobViewCache::new(8, Duration::from_secs(60));
        cache.put(sample_view(1)).unwrap();
        cache.put(sample_view(2)).unwrap();
        cache.put_search("q=rust", "[1,2]".to_string()).unwrap();

        cache.invalidate(1).unwrap();

        assert!(cache.get(1).unwrap().is_none());
        assert!(cache.get(2).unwrap().is_some());
        assert!(cache.get_search("q=rust").unwrap().is_none());
    }

    #[test]
    fn search_entries_expire() {
        let cache = LruJobViewCache::new(8, Duration::from_millis(0));
        cache.put_search("q=rust", "[1]".to_string()).unwrap();
        assert!(cache.get_search("q=rust").unwrap().is_none());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = LruJobViewCache::new(2, Duration::from_secs(60));
        cache.put(sample_view(1)).unwrap();
        cache.put(sample_view(2)).unwrap();
        cache.get(1).unwrap();
        cache.put(sample_view(3)).unwrap();

        assert!(cache.get(2).unwrap().is_none());
        assert!(cache.get(1).unwrap().is_some());
    }
}
