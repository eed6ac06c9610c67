//! Order lifecycle events
//!
//! The ledger publishes an event after every committed order mutation.
//! Publication is at-most-once and best-effort: events go onto a bounded
//! queue without blocking, a full queue drops the event with a warning, and
//! the caller never sees a failure. A consumer worker drains the queue and
//! bridges each event to a customer notification.

use chrono::{DateTime, Utc};
use crossbeam_queue::ArrayQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::OrderStatus;
use crate::notify::NotificationSink;

/// Order lifecycle event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_id: Uuid,
    pub order_id: i64,
    pub customer_id: i64,
    pub service_id: i64,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl OrderEvent {
    pub fn new(
        order_id: i64,
        customer_id: i64,
        service_id: i64,
        status: OrderStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id,
            customer_id,
            service_id,
            status,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Best-effort event publication
///
/// `publish` must not block and must not fail the caller; a lost event is
/// logged, never surfaced.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: OrderEvent);
}

/// Bounded in-process event queue
///
/// Producer side implements [`EventPublisher`]; the consumer side is drained
/// by [`spawn_consumer`].
pub struct EventBus {
    queue: Arc<ArrayQueue<OrderEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(capacity)),
        }
    }

    pub fn pop(&self) -> Option<OrderEvent> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: OrderEvent) {
        tracing::debug!(
            order_id = event.order_id,
            status = %event.status,
            "publishing order event"
        );
        if self.queue.push(event).is_err() {
            tracing::warn!("order event queue full, dropping event");
        }
    }
}

/// Spawn the worker that drains the event queue
///
/// Each event is logged and forwarded to the customer as an "Order Update"
/// notification. The task runs for the lifetime of the process.
pub fn spawn_consumer(
    bus: Arc<EventBus>,
    notifier: Arc<dyn NotificationSink>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match bus.pop() {
                Some(event) => {
                    tracing::info!(
                        order_id = event.order_id,
                        customer_id = event.customer_id,
                        status = %event.status,
                        message = %event.message,
                        "order event consumed"
                    );
                    let kind = format!("ORDER_{}", event.status.as_str());
                    notifier.notify(event.customer_id, &kind, "Order Update", &event.message);
                }
                None => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(i64, String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, user_id: i64, kind: &str, _title: &str, message: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((user_id, kind.to_string(), message.to_string()));
        }

        fn broadcast(&self, _kind: &str, _title: &str, _message: &str) {}
    }

    #[test]
    fn test_full_queue_drops_without_error() {
        let bus = EventBus::new(2);
        for i in 0..5 {
            bus.publish(OrderEvent::new(i, 1, 1, OrderStatus::Pending, "x"));
        }
        // Capacity 2: the later events were dropped, nothing panicked.
        assert_eq!(bus.len(), 2);
        assert_eq!(bus.pop().unwrap().order_id, 0);
        assert_eq!(bus.pop().unwrap().order_id, 1);
        assert!(bus.pop().is_none());
    }

    #[tokio::test]
    async fn test_consumer_bridges_events_to_notifications() {
        let bus = Arc::new(EventBus::new(16));
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_consumer(bus.clone(), sink.clone());

        bus.publish(OrderEvent::new(
            3,
            42,
            7,
            OrderStatus::Completed,
            "Order status updated to COMPLETED",
        ));

        // Give the worker a couple of poll cycles.
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if !sink.sent.lock().unwrap().is_empty() {
                break;
            }
        }
        handle.abort();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 42);
        assert_eq!(sent[0].1, "ORDER_COMPLETED");
    }
}
