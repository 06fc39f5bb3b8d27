//! Connection registry.
//!
//! In-memory index of live connections by user and by conversation
//! subscription. All mutation happens under one mutex; outbound delivery
//! uses unbounded channel sends, which never block, so the lock is never
//! held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Identifier of one live connection. A user may hold several at once.
pub type ConnectionId = Uuid;

struct Inner {
    /// Outbound channel per connection; the websocket writer task drains it.
    senders: HashMap<ConnectionId, UnboundedSender<String>>,
    by_user: HashMap<i64, HashSet<ConnectionId>>,
    by_conversation: HashMap<i64, HashSet<ConnectionId>>,
    /// Reverse index for O(handle) cleanup on disconnect.
    owner: HashMap<ConnectionId, i64>,
}

/// Tracks live connections and resolves fan-out targets.
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                senders: HashMap::new(),
                by_user: HashMap::new(),
                by_conversation: HashMap::new(),
                owner: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a connection under a user. Idempotent per connection id.
    pub fn register(&self, user_id: i64, id: ConnectionId, sender: UnboundedSender<String>) {
        let mut inner = self.lock();
        inner.senders.insert(id, sender);
        inner.owner.insert(id, user_id);
        inner.by_user.entry(user_id).or_default().insert(id);
    }

    /// Subscribe one connection to a conversation's broadcasts.
    pub fn subscribe(&self, conversation_id: i64, id: ConnectionId) {
        let mut inner = self.lock();
        if inner.senders.contains_key(&id) {
            inner
                .by_conversation
                .entry(conversation_id)
                .or_default()
                .insert(id);
        }
    }

    /// Subscribe every live connection of a user to a conversation.
    pub fn subscribe_user(&self, conversation_id: i64, user_id: i64) {
        let mut inner = self.lock();
        let handles: Vec<ConnectionId> = inner
            .by_user
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        if handles.is_empty() {
            return;
        }
        let set = inner.by_conversation.entry(conversation_id).or_default();
        for id in handles {
            set.insert(id);
        }
    }

    /// Remove a connection from every index. Called on disconnect and on
    /// send failure. Returns the owning user id when this was the user's
    /// last live connection.
    pub fn unregister(&self, id: ConnectionId) -> Option<i64> {
        let mut inner = self.lock();
        inner.senders.remove(&id);
        let mut last_of_user = None;
        if let Some(user_id) = inner.owner.remove(&id) {
            if let Some(set) = inner.by_user.get_mut(&user_id) {
                set.remove(&id);
                if set.is_empty() {
                    inner.by_user.remove(&user_id);
                    last_of_user = Some(user_id);
                }
            }
        }
        inner.by_conversation.retain(|_, set| {
            set.remove(&id);
            !set.is_empty()
        });
        last_of_user
    }

    /// Send a serialized event to every subscriber of a conversation.
    ///
    /// Best-effort: a connection whose channel is closed is purged, and
    /// delivery continues to the remaining subscribers.
    pub fn broadcast(&self, conversation_id: i64, payload: &str) {
        let failed = {
            let inner = self.lock();
            let Some(subscribers) = inner.by_conversation.get(&conversation_id) else {
                return;
            };
            let mut failed = Vec::new();
            for id in subscribers {
                match inner.senders.get(id) {
                    Some(sender) if sender.send(payload.to_string()).is_ok() => {}
                    _ => failed.push(*id),
                }
            }
            metrics::counter!("chat_broadcasts_total")
                .increment((subscribers.len() - failed.len()) as u64);
            failed
        };

        for id in failed {
            tracing::debug!(connection_id = %id, "Dropping unreachable connection");
            self.unregister(id);
        }
    }

    /// Send a serialized event to one connection, purging it on failure.
    pub fn send_to(&self, id: ConnectionId, payload: &str) {
        let delivered = {
            let inner = self.lock();
            match inner.senders.get(&id) {
                Some(sender) => sender.send(payload.to_string()).is_ok(),
                None => return,
            }
        };
        if !delivered {
            self.unregister(id);
        }
    }

    /// Send a structured error event to one connection only.
    pub fn send_error(&self, id: ConnectionId, message: &str) {
        let payload = serde_json::json!({ "error": message }).to_string();
        self.send_to(id, &payload);
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, conversation_id: i64) -> usize {
        self.lock()
            .by_conversation
            .get(&conversation_id)
            .map_or(0, |set| set.len())
    }

    #[cfg(test)]
    pub fn connection_count(&self, user_id: i64) -> usize {
        self.lock().by_user.get(&user_id).map_or(0, |set| set.len())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn connect(
        registry: &ConnectionRegistry,
        user_id: i64,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        registry.register(user_id, id, tx);
        (id, rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connect(&registry, 1);
        let (b, mut rx_b) = connect(&registry, 2);
        registry.subscribe(7, a);
        registry.subscribe(7, b);

        registry.broadcast(7, "hello");

        assert_eq!(rx_a.recv().await.unwrap(), "hello");
        assert_eq!(rx_b.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn failed_send_purges_handle_but_not_broadcast() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connect(&registry, 1);
        let (b, rx_b) = connect(&registry, 2);
        registry.subscribe(7, a);
        registry.subscribe(7, b);

        // Simulate a dead transport by dropping the receiver.
        drop(rx_b);
        registry.broadcast(7, "hello");

        assert_eq!(rx_a.recv().await.unwrap(), "hello");
        assert_eq!(registry.subscriber_count(7), 1);
        assert_eq!(registry.connection_count(2), 0);
    }

    #[tokio::test]
    async fn unregister_removes_from_every_index() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = connect(&registry, 1);
        registry.subscribe(7, a);
        registry.subscribe(8, a);

        assert_eq!(registry.unregister(a), Some(1));

        assert_eq!(registry.connection_count(1), 0);
        assert_eq!(registry.subscriber_count(7), 0);
        assert_eq!(registry.subscriber_count(8), 0);
    }

    #[tokio::test]
    async fn subscribe_user_covers_all_devices() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = connect(&registry, 1);
        let (_b, mut rx_b) = connect(&registry, 1);

        registry.subscribe_user(7, 1);
        registry.broadcast(7, "ping");

        assert_eq!(rx_a.recv().await.unwrap(), "ping");
        assert_eq!(rx_b.recv().await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn send_error_targets_one_connection() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connect(&registry, 1);
        let (_b, mut rx_b) = connect(&registry, 2);

        registry.send_error(a, "Invalid message format");

        assert_eq!(
            rx_a.recv().await.unwrap(),
            r#"{"error":"Invalid message format"}"#
        );
        assert!(rx_b.try_recv().is_err());
    }
}
