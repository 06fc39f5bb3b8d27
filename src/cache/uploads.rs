//! Upload handoff cache.
//!
//! The upload endpoint (owned by a separate service) records each validated
//! file here before the client references it in a chat message. Attachment
//! messages are only accepted when every named file has a live entry for
//! the sending user, and consumed entries are removed so a URL cannot be
//! replayed into a second message.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CacheResult;

/// Metadata recorded for one validated upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    pub name: String,
    pub url: String,
    pub size: i64,
    pub content_type: String,
}

impl FileInfo {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Key: the uploading user, the target conversation (0 when the upload
/// precedes conversation creation), and the file name.
type UploadKey = (i64, i64, String);

struct UploadEntry {
    info: FileInfo,
    stored_at: Instant,
}

/// In-process TTL'd store of validated uploads awaiting a message.
pub struct UploadCache {
    entries: Mutex<HashMap<UploadKey, UploadEntry>>,
    ttl: Duration,
}

impl UploadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UploadKey, UploadEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a validated upload for the given user and conversation.
    pub fn put(&self, user_id: i64, conversation_id: i64, info: FileInfo) -> CacheResult<()> {
        self.lock().insert(
            (user_id, conversation_id, info.name.clone()),
            UploadEntry {
                info,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Look up a live entry by name, falling back to the conversation-less
    /// slot used when the upload happened before the conversation existed.
    pub fn get(
        &self,
        user_id: i64,
        conversation_id: i64,
        name: &str,
    ) -> CacheResult<Option<FileInfo>> {
        let mut entries = self.lock();
        for key in [
            (user_id, conversation_id, name.to_string()),
            (user_id, 0, name.to_string()),
        ] {
            match entries.get(&key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Ok(Some(entry.info.clone()));
                }
                Some(_) => {
                    entries.remove(&key);
                }
                None => {}
            }
        }
        Ok(None)
    }

    /// Remove consumed entries after the message they back is persisted.
    pub fn remove_many(&self, user_id: i64, conversation_id: i64, names: &[String]) {
        let mut entries = self.lock();
        for name in names {
            entries.remove(&(user_id, conversation_id, name.clone()));
            entries.remove(&(user_id, 0, name.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, content_type: &str) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            url: format!("https://cdn.example.com/{name}"),
            size: 1024,
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn get_prefers_conversation_slot_then_falls_back() {
        let cache = UploadCache::new(Duration::from_secs(60));
        cache.put(1, 0, info("cv.pdf", "application/pdf")).unwrap();

        let hit = cache.get(1, 42, "cv.pdf").unwrap().unwrap();
        assert_eq!(hit.url, "https://cdn.example.com/cv.pdf");
        assert!(cache.get(2, 42, "cv.pdf").unwrap().is_none());
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = UploadCache::new(Duration::from_millis(0));
        cache.put(1, 42, info("a.png", "image/png")).unwrap();
        assert!(cache.get(1, 42, "a.png").unwrap().is_none());
    }

    #[test]
    fn remove_many_clears_both_slots() {
        let cache = UploadCache::new(Duration::from_secs(60));
        cache.put(1, 42, info("a.png", "image/png")).unwrap();
        cache.put(1, 0, info("b.png", "image/png")).unwrap();

        cache.remove_many(1, 42, &["a.png".to_string(), "b.png".to_string()]);

        assert!(cache.get(1, 42, "a.png").unwrap().is_none());
        assert!(cache.get(1, 42, "b.png").unwrap().is_none());
    }

    #[test]
    fn image_detection_uses_content_type() {
        assert!(info("a.png", "image/png").is_image());
        assert!(!info("cv.pdf", "application/pdf").is_image());
    }
}
