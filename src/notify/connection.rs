//! Websocket connection registry
//!
//! Maps user ids to their open notification sockets using DashMap for
//! concurrent access. A user may hold several connections at once (mobile
//! plus web).

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::Notification;

/// Sender half of a connected client's notification channel
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Unique connection identifier
pub type ConnectionId = u64;

/// Registry of active notification connections
pub struct ConnectionRegistry {
    /// user_id -> list of (connection_id, sender)
    connections: DashMap<i64, Vec<(ConnectionId, NotificationSender)>>,
    next_conn_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection for a user and return its id.
    pub fn add(&self, user_id: i64, tx: NotificationSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        self.connections
            .entry(user_id)
            .or_insert_with(Vec::new)
            .push((conn_id, tx));

        tracing::info!(user_id, conn_id, "notification connection added");
        conn_id
    }

    /// Drop a closed connection, cleaning up empty user entries.
    pub fn remove(&self, user_id: i64, conn_id: ConnectionId) {
        if let Some(mut senders) = self.connections.get_mut(&user_id) {
            senders.retain(|(id, _)| *id != conn_id);
            if senders.is_empty() {
                drop(senders); // release the shard lock before removing the entry
                self.connections.remove(&user_id);
            }
        }
        tracing::info!(user_id, conn_id, "notification connection removed");
    }

    /// Push a notification to every connection of one user.
    ///
    /// Send failures mean the client went away; the ws handler removes the
    /// connection when it observes the close, so failures are only logged.
    pub fn send_to_user(&self, user_id: i64, notification: &Notification) {
        if let Some(senders) = self.connections.get(&user_id) {
            for (conn_id, tx) in senders.iter() {
                if tx.send(notification.clone()).is_err() {
                    tracing::warn!(user_id, conn_id, "notification send failed, client gone");
                }
            }
        }
    }

    /// Push a notification to every connected user.
    pub fn send_to_all(&self, notification: &Notification) {
        for entry in self.connections.iter() {
            for (conn_id, tx) in entry.value().iter() {
                if tx.send(notification.clone()).is_err() {
                    tracing::warn!(
                        user_id = *entry.key(),
                        conn_id,
                        "broadcast send failed, client gone"
                    );
                }
            }
        }
    }

    /// Number of open connections across all users.
    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|e| e.value().len()).sum()
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

    #[tokio::test]
    async fn test_add_send_remove() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn_id = registry.add(42, tx);
        assert_eq!(registry.connection_count(), 1);

        let note = Notification::to_user(42, "ORDER_CREATED", "Order Created", "hi");
        registry.send_to_user(42, &note);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, "ORDER_CREATED");

        registry.remove(42, conn_id);
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_is_noop() {
        let registry = ConnectionRegistry::new();
        let note = Notification::to_user(7, "X", "t", "m");
        registry.send_to_user(7, &note); // must not panic
    }

    #[tokio::test]
    async fn test_multiple_connections_per_user() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.add(5, tx1);
        registry.add(5, tx2);

        registry.send_to_user(5, &Notification::to_user(5, "K", "t", "m"));
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }
}
