//! Order Ledger - owns order records and their state transitions
//!
//! All order mutations go through here: creation, status transitions,
//! cancellation and deletion. Each mutation is atomic on the single order it
//! touches; after the store commit the ledger emits a lifecycle event and
//! notifications, both best-effort. Reads return the projected order view
//! with customer/service/provider names resolved at read time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::events::{EventPublisher, OrderEvent};
use crate::models::{Order, OrderStatus, ServiceOffering, User};
use crate::notify::NotificationSink;
use crate::store::{CatalogStore, IdentityStore, NewOrder, OrderStore, StoreError};

/// Order Ledger error
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("order not found: {0}")]
    OrderNotFound(i64),

    #[error("customer not found: {0}")]
    CustomerNotFound(i64),

    #[error("service not found: {0}")]
    ServiceNotFound(i64),

    #[error("scheduled date time is required")]
    MissingSchedule,

    #[error("service {0} has no price set")]
    MissingPrice(i64),

    #[error("provider {acting} cannot update order {order_id} owned by provider {assigned}")]
    NotOwner {
        order_id: i64,
        acting: i64,
        assigned: i64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Payload for placing an order
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub service_id: i64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Order projection returned by every read and mutate operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub service_id: i64,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// The Order Ledger
///
/// Collaborators are trait objects so tests can substitute in-memory stores
/// and recording publishers/sinks.
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    identity: Arc<dyn IdentityStore>,
    catalog: Arc<dyn CatalogStore>,
    events: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationSink>,
}

impl OrderLedger {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        identity: Arc<dyn IdentityStore>,
        catalog: Arc<dyn CatalogStore>,
        events: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            orders,
            identity,
            catalog,
            events,
            notifier,
        }
    }

    /// Place a new order for a customer.
    ///
    /// Snapshots the service price into `total_price`, copies the service's
    /// assigned provider, and falls back to the customer's stored address
    /// when the request carries none. The committed order is durable before
    /// any event or notification goes out; messaging failures never roll it
    /// back.
    pub async fn create_order(
        &self,
        customer_id: i64,
        req: PlaceOrder,
    ) -> Result<OrderView, LedgerError> {
        let customer = self
            .identity
            .find_by_id(customer_id)
            .await?
            .ok_or(LedgerError::CustomerNotFound(customer_id))?;

        let service = self
            .catalog
            .find_service(req.service_id)
            .await?
            .ok_or(LedgerError::ServiceNotFound(req.service_id))?;

        let scheduled_at = req.scheduled_at.ok_or(LedgerError::MissingSchedule)?;

        let price = service.price.ok_or(LedgerError::MissingPrice(service.id))?;

        let order = self
            .orders
            .insert(NewOrder {
                customer_id: customer.id,
                service_id: service.id,
                provider_id: service.provider_id,
                scheduled_at,
                address: req.address.or_else(|| customer.address.clone()),
                notes: req.notes,
                status: OrderStatus::Pending,
                total_price: price,
            })
            .await?;

        tracing::info!(
            order_id = order.id,
            customer_id = customer.id,
            service_id = service.id,
            total_price = %order.total_price,
            "order created"
        );

        self.events.publish(OrderEvent::new(
            order.id,
            customer.id,
            service.id,
            order.status,
            "Order created successfully",
        ));

        self.notifier.notify(
            customer.id,
            "ORDER_CREATED",
            "Order Created",
            &format!(
                "Your order for {} has been created successfully",
                service.name
            ),
        );
        if let Some(provider_id) = service.provider_id {
            self.notifier.notify(
                provider_id,
                "NEW_ORDER",
                "New Order",
                &format!("You have a new order for {}", service.name),
            );
        }

        self.project(order, Some(customer), Some(service)).await
    }

    /// Update an order's status.
    ///
    /// When `acting_provider` is given and the order has an assigned
    /// provider, the two must match. The status itself is written
    /// unconditionally: role-gated callers only offer valid transitions, and
    /// administrators may override. Leaving a terminal status is logged.
    pub async fn update_status(
        &self,
        order_id: i64,
        new_status: OrderStatus,
        acting_provider: Option<i64>,
    ) -> Result<OrderView, LedgerError> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        match (acting_provider, order.provider_id) {
            (Some(acting), Some(assigned)) if acting != assigned => {
                return Err(LedgerError::NotOwner {
                    order_id,
                    acting,
                    assigned,
                });
            }
            (Some(acting), None) => {
                // No assigned provider: any acting provider may update.
                tracing::warn!(
                    order_id,
                    acting_provider = acting,
                    "status update on order without assigned provider"
                );
            }
            _ => {}
        }

        if order.status.is_terminal() && new_status != order.status {
            tracing::warn!(
                order_id,
                from = %order.status,
                to = %new_status,
                "transition out of terminal status"
            );
        }

        order.status = new_status;
        if new_status == OrderStatus::Completed {
            order.completed_at = Some(Utc::now());
        }

        let order = self.orders.update(order).await?;

        tracing::info!(order_id, status = %new_status, "order status updated");

        self.events.publish(OrderEvent::new(
            order.id,
            order.customer_id,
            order.service_id,
            order.status,
            format!("Order status updated to {}", new_status),
        ));

        self.notifier.notify(
            order.customer_id,
            "ORDER_STATUS_UPDATED",
            "Order Status Updated",
            &format!("Your order status has been updated to {}", new_status),
        );

        self.project(order, None, None).await
    }

    /// Status update without an ownership check, for administrative callers.
    pub async fn update_status_unchecked(
        &self,
        order_id: i64,
        new_status: OrderStatus,
    ) -> Result<OrderView, LedgerError> {
        self.update_status(order_id, new_status, None).await
    }

    /// Cancel an order.
    ///
    /// Forces CANCELLED regardless of current status, so repeated calls are
    /// idempotent in effect. The assigned provider is told; the customer is
    /// not (cancellation is customer-initiated).
    pub async fn cancel(&self, order_id: i64) -> Result<(), LedgerError> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        order.status = OrderStatus::Cancelled;
        let order = self.orders.update(order).await?;

        tracing::info!(order_id, "order cancelled");

        self.events.publish(OrderEvent::new(
            order.id,
            order.customer_id,
            order.service_id,
            OrderStatus::Cancelled,
            "Order cancelled",
        ));

        if let Some(provider_id) = order.provider_id {
            self.notifier.notify(
                provider_id,
                "ORDER_CANCELLED",
                "Order Cancelled",
                &format!("Order #{} has been cancelled", order.id),
            );
        }

        Ok(())
    }

    /// Permanently remove an order.
    ///
    /// Hard delete: the only trace left is the deletion event, which carries
    /// the order's status at the time it was removed.
    pub async fn delete(&self, order_id: i64) -> Result<(), LedgerError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        self.events.publish(OrderEvent::new(
            order.id,
            order.customer_id,
            order.service_id,
            order.status,
            "Order deleted",
        ));

        self.orders.delete(order_id).await?;
        tracing::info!(order_id, status = %order.status, "order deleted");
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<OrderView>, LedgerError> {
        let orders = self.orders.all().await?;
        self.project_many(orders).await
    }

    pub async fn by_id(&self, order_id: i64) -> Result<OrderView, LedgerError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;
        self.project(order, None, None).await
    }

    pub async fn by_customer(&self, customer_id: i64) -> Result<Vec<OrderView>, LedgerError> {
        let orders = self.orders.by_customer(customer_id).await?;
        self.project_many(orders).await
    }

    pub async fn by_provider(&self, provider_id: i64) -> Result<Vec<OrderView>, LedgerError> {
        let orders = self.orders.by_provider(provider_id).await?;
        self.project_many(orders).await
    }

    pub async fn by_status(&self, status: OrderStatus) -> Result<Vec<OrderView>, LedgerError> {
        let orders = self.orders.by_status(status).await?;
        self.project_many(orders).await
    }

    async fn project_many(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, LedgerError> {
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.project(order, None, None).await?);
        }
        Ok(views)
    }

    /// Build the caller-facing projection, resolving names through the
    /// identity and catalog stores. Pre-fetched customer/service records can
    /// be passed in to save the lookups.
    async fn project(
        &self,
        order: Order,
        customer: Option<User>,
        service: Option<ServiceOffering>,
    ) -> Result<OrderView, LedgerError> {
        let customer = match customer {
            Some(c) => c,
            None => self
                .identity
                .find_by_id(order.customer_id)
                .await?
                .ok_or(LedgerError::CustomerNotFound(order.customer_id))?,
        };
        let service = match service {
            Some(s) => s,
            None => self
                .catalog
                .find_service(order.service_id)
                .await?
                .ok_or(LedgerError::ServiceNotFound(order.service_id))?,
        };

        let provider = match order.provider_id {
            Some(id) => self.identity.find_by_id(id).await?,
            None => None,
        };

        Ok(OrderView {
            id: order.id,
            customer_id: customer.id,
            customer_name: customer.full_name(),
            service_id: service.id,
            service_name: service.name,
            provider_id: order.provider_id,
            provider_name: provider.map(|p| p.full_name()),
            scheduled_at: order.scheduled_at,
            address: order.address,
            notes: order.notes,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
            completed_at: order.completed_at,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::{
        MemoryCatalogStore, MemoryIdentityStore, MemoryOrderStore, NewService, NewUser,
    };
    use std::sync::Mutex;

    /// Event publisher that records instead of queueing.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub events: Mutex<Vec<OrderEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: OrderEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Notification sink that records instead of pushing.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<(i64, String, String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, user_id: i64, kind: &str, title: &str, message: &str) {
            self.sent.lock().unwrap().push((
                user_id,
                kind.to_string(),
                title.to_string(),
                message.to_string(),
            ));
        }

        fn broadcast(&self, _kind: &str, _title: &str, _message: &str) {}
    }

    pub struct Fixture {
        pub orders: Arc<MemoryOrderStore>,
        pub identity: Arc<MemoryIdentityStore>,
        pub catalog: Arc<MemoryCatalogStore>,
        pub events: Arc<RecordingPublisher>,
        pub sink: Arc<RecordingSink>,
        pub ledger: OrderLedger,
    }

    pub async fn fixture() -> Fixture {
        let orders = Arc::new(MemoryOrderStore::new());
        let identity = Arc::new(MemoryIdentityStore::new());
        let catalog = Arc::new(MemoryCatalogStore::new());
        let events = Arc::new(RecordingPublisher::default());
        let sink = Arc::new(RecordingSink::default());
        let ledger = OrderLedger::new(
            orders.clone(),
            identity.clone(),
            catalog.clone(),
            events.clone(),
            sink.clone(),
        );
        Fixture {
            orders,
            identity,
            catalog,
            events,
            sink,
            ledger,
        }
    }

    pub fn user(username: &str, role: Role, address: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: username.to_string(),
            last_name: "Smith".to_string(),
            phone: None,
            address: address.map(|a| a.to_string()),
            role,
            active: true,
        }
    }

    pub fn service(name: &str, price: Option<Decimal>, provider_id: Option<i64>) -> NewService {
        NewService {
            name: name.to_string(),
            description: None,
            price,
            duration_minutes: Some(60),
            image_url: None,
            category_id: 1,
            provider_id,
            active: true,
        }
    }

    fn place(service_id: i64) -> PlaceOrder {
        PlaceOrder {
            service_id,
            scheduled_at: Some(Utc::now()),
            address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_snapshots_price_and_provider() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c42", Role::Customer, Some("12 Elm St")))
            .await
            .unwrap();
        let provider = f.identity.insert(user("p3", Role::Provider, None)).await.unwrap();
        let svc = f
            .catalog
            .insert_service(service(
                "Deep Clean",
                Some(Decimal::new(150000, 2)),
                Some(provider.id),
            ))
            .await
            .unwrap();

        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.total_price, Decimal::new(150000, 2));
        assert_eq!(view.provider_id, Some(provider.id));
        assert_eq!(view.address.as_deref(), Some("12 Elm St"));
        assert!(view.completed_at.is_none());

        // Later price changes must not touch the snapshot.
        let mut changed = f.catalog.find_service(svc.id).await.unwrap().unwrap();
        changed.price = Some(Decimal::new(999900, 2));
        f.catalog.update_service(changed).await.unwrap();
        let reread = f.ledger.by_id(view.id).await.unwrap();
        assert_eq!(reread.total_price, Decimal::new(150000, 2));

        // One event, customer + provider notifications.
        assert_eq!(f.events.events.lock().unwrap().len(), 1);
        let sent = f.sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, "ORDER_CREATED");
        assert_eq!(sent[1], (
            provider.id,
            "NEW_ORDER".to_string(),
            "New Order".to_string(),
            "You have a new order for Deep Clean".to_string(),
        ));
    }

    #[tokio::test]
    async fn test_create_order_missing_refs() {
        let f = fixture().await;
        let err = f.ledger.create_order(99, place(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::CustomerNotFound(99)));

        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let err = f.ledger.create_order(customer.id, place(77)).await.unwrap_err();
        assert!(matches!(err, LedgerError::ServiceNotFound(77)));
    }

    #[tokio::test]
    async fn test_create_order_missing_schedule_and_price() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let svc = f
            .catalog
            .insert_service(service("Priced", Some(Decimal::ONE), None))
            .await
            .unwrap();
        let unpriced = f
            .catalog
            .insert_service(service("Unpriced", None, None))
            .await
            .unwrap();

        let err = f
            .ledger
            .create_order(
                customer.id,
                PlaceOrder {
                    service_id: svc.id,
                    scheduled_at: None,
                    address: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingSchedule));

        let err = f
            .ledger
            .create_order(customer.id, place(unpriced.id))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingPrice(id) if id == unpriced.id));

        // Failed creations leave no orders and emit nothing.
        assert_eq!(f.orders.count().await.unwrap(), 0);
        assert!(f.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completed_at_set_once_and_kept() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), None))
            .await
            .unwrap();
        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        let done = f
            .ledger
            .update_status(view.id, OrderStatus::Completed, None)
            .await
            .unwrap();
        let completed_at = done.completed_at.expect("completed_at set");

        // Moving to a non-terminal status leaves completed_at untouched.
        let reopened = f
            .ledger
            .update_status(view.id, OrderStatus::InProgress, None)
            .await
            .unwrap();
        assert_eq!(reopened.completed_at, Some(completed_at));
        assert_eq!(reopened.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_provider_ownership_check() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let p3 = f.identity.insert(user("p3", Role::Provider, None)).await.unwrap();
        let p9 = f.identity.insert(user("p9", Role::Provider, None)).await.unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), Some(p3.id)))
            .await
            .unwrap();
        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        // Mismatched provider is rejected for every requested status.
        for status in OrderStatus::ALL {
            let err = f
                .ledger
                .update_status(view.id, status, Some(p9.id))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::NotOwner { .. }));
        }

        // The assigned provider succeeds.
        let ok = f
            .ledger
            .update_status(view.id, OrderStatus::Confirmed, Some(p3.id))
            .await
            .unwrap();
        assert_eq!(ok.status, OrderStatus::Confirmed);

        // Admin path (no acting provider) is never ownership-checked.
        let ok = f
            .ledger
            .update_status_unchecked(view.id, OrderStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(ok.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_unassigned_order_accepts_any_provider() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let p9 = f.identity.insert(user("p9", Role::Provider, None)).await.unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), None))
            .await
            .unwrap();
        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        let ok = f
            .ledger
            .update_status(view.id, OrderStatus::Confirmed, Some(p9.id))
            .await
            .unwrap();
        assert_eq!(ok.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_notifies_provider_only() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let p3 = f.identity.insert(user("p3", Role::Provider, None)).await.unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), Some(p3.id)))
            .await
            .unwrap();
        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();
        f.sink.sent.lock().unwrap().clear();

        f.ledger.cancel(view.id).await.unwrap();
        f.ledger.cancel(view.id).await.unwrap();

        let order = f.orders.find(view.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);

        let sent = f.sink.sent.lock().unwrap();
        assert!(sent.iter().all(|(user_id, kind, _, _)| {
            *user_id == p3.id && kind == "ORDER_CANCELLED"
        }));
    }

    #[tokio::test]
    async fn test_delete_emits_event_with_pre_delete_status() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), None))
            .await
            .unwrap();
        let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();
        f.ledger
            .update_status(view.id, OrderStatus::Confirmed, None)
            .await
            .unwrap();

        f.ledger.delete(view.id).await.unwrap();
        assert!(f.orders.find(view.id).await.unwrap().is_none());

        let events = f.events.events.lock().unwrap();
        let deletion = events.last().unwrap();
        assert_eq!(deletion.status, OrderStatus::Confirmed);

        drop(events);
        let err = f.ledger.delete(view.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_order_leaves_set_unchanged() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("c1", Role::Customer, None))
            .await
            .unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::TEN), None))
            .await
            .unwrap();
        f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        let err = f.ledger.delete(404).await.unwrap_err();
        assert!(matches!(err, LedgerError::OrderNotFound(404)));
        assert_eq!(f.orders.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reads_project_names() {
        let f = fixture().await;
        let customer = f
            .identity
            .insert(user("carol", Role::Customer, None))
            .await
            .unwrap();
        let provider = f
            .identity
            .insert(user("pete", Role::Provider, None))
            .await
            .unwrap();
        let svc = f
            .catalog
            .insert_service(service("Lawn Care", Some(Decimal::TEN), Some(provider.id)))
            .await
            .unwrap();
        f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();

        let all = f.ledger.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].customer_name, "carol Smith");
        assert_eq!(all[0].service_name, "Lawn Care");
        assert_eq!(all[0].provider_name.as_deref(), Some("pete Smith"));

        assert_eq!(f.ledger.by_customer(customer.id).await.unwrap().len(), 1);
        assert_eq!(f.ledger.by_provider(provider.id).await.unwrap().len(), 1);
        assert_eq!(
            f.ledger.by_status(OrderStatus::Pending).await.unwrap().len(),
            1
        );
        assert!(f.ledger.by_status(OrderStatus::Completed).await.unwrap().is_empty());
    }
}
