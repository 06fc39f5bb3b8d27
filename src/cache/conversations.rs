//! Per-user conversation id list cache.
//!
//! Advisory copy of each member's conversation ids, consulted before the
//! database on membership checks and appended to when a conversation is
//! created or a member joins.

use std::collections::HashMap;
use std::sync::Mutex;

use super::CacheResult;

/// Maps account id to the ids of conversations the account belongs to.
pub struct ConversationListCache {
    by_user: Mutex<HashMap<i64, Vec<i64>>>,
}

impl ConversationListCache {
    pub fn new() -> Self {
        Self {
            by_user: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Vec<i64>>> {
        self.by_user.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached conversation ids for a user, `None` when the user has no
    /// cached list yet.
    pub fn get(&self, user_id: i64) -> CacheResult<Option<Vec<i64>>> {
        Ok(self.lock().get(&user_id).cloned())
    }

    /// Replace the cached list for a user.
    pub fn set(&self, user_id: i64, conversation_ids: Vec<i64>) -> CacheResult<()> {
        self.lock().insert(user_id, conversation_ids);
        Ok(())
    }

    /// Append a conversation id to a user's cached list, if one exists.
    ///
    /// A user without a cached list stays uncached; the next membership
    /// check repopulates from the database.
    pub fn append(&self, user_id: i64, conversation_id: i64) -> CacheResult<()> {
        if let Some(list) = self.lock().get_mut(&user_id) {
            if !list.contains(&conversation_id) {
                list.push(conversation_id);
            }
        }
        Ok(())
    }

    /// Drop a user's cached list entirely.
    pub fn evict(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }
}

impl Default for ConversationListCache {
    fn default() -> Self {
        Self::new()
    }
}
