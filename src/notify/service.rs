//! Notification Sink contract and its websocket implementation

use std::sync::Arc;

use super::connection::ConnectionRegistry;
use super::messages::Notification;

/// Fire-and-forget notification delivery
///
/// Implementations must never block the caller on delivery and must swallow
/// delivery failures. Order-state correctness does not depend on this
/// channel.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: i64, kind: &str, title: &str, message: &str);
    fn broadcast(&self, kind: &str, title: &str, message: &str);
}

/// Websocket-backed notification sink
pub struct WsNotifier {
    registry: Arc<ConnectionRegistry>,
}

impl WsNotifier {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

impl NotificationSink for WsNotifier {
    fn notify(&self, user_id: i64, kind: &str, title: &str, message: &str) {
        let notification = Notification::to_user(user_id, kind, title, message);
        tracing::debug!(user_id, kind, "pushing notification");
        self.registry.send_to_user(user_id, &notification);
    }

    fn broadcast(&self, kind: &str, title: &str, message: &str) {
        let notification = Notification::broadcast(kind, title, message);
        tracing::debug!(kind, "pushing broadcast notification");
        self.registry.send_to_all(&notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_notify_reaches_registered_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = WsNotifier::new(registry.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.add(9, tx);

        notifier.notify(9, "ORDER_CANCELLED", "Order Cancelled", "Order #3 has been cancelled");
        let note = rx.recv().await.unwrap();
        assert_eq!(note.user_id, Some(9));
        assert_eq!(note.title, "Order Cancelled");
        assert!(!note.read);
    }

    #[tokio::test]
    async fn test_broadcast_has_no_user() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = WsNotifier::new(registry.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.add(1, tx);

        notifier.broadcast("MAINTENANCE", "Heads up", "Scheduled downtime");
        let note = rx.recv().await.unwrap();
        assert_eq!(note.user_id, None);
    }
}
