//! End-to-end order lifecycle scenarios over the in-memory stores
//!
//! Wires the real event bus, consumer worker and websocket notifier the
//! same way the binary does, then drives the ledger and stats read path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use servhub::events::{spawn_consumer, EventBus};
use servhub::ledger::{LedgerError, OrderLedger, PlaceOrder};
use servhub::models::{OrderStatus, Role};
use servhub::notify::{ConnectionRegistry, NotificationSink, WsNotifier};
use servhub::stats::StatsService;
use servhub::store::{
    CatalogStore, IdentityStore, MemoryCatalogStore, MemoryIdentityStore, MemoryOrderStore,
    NewService, NewUser, OrderStore,
};

struct Harness {
    identity: Arc<MemoryIdentityStore>,
    catalog: Arc<MemoryCatalogStore>,
    orders: Arc<MemoryOrderStore>,
    registry: Arc<ConnectionRegistry>,
    ledger: OrderLedger,
    stats: StatsService,
}

fn harness() -> Harness {
    let identity = Arc::new(MemoryIdentityStore::new());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orders = Arc::new(MemoryOrderStore::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let notifier: Arc<dyn NotificationSink> = Arc::new(WsNotifier::new(registry.clone()));

    let bus = Arc::new(EventBus::new(64));
    let _consumer = spawn_consumer(bus.clone(), notifier.clone());

    let ledger = OrderLedger::new(
        orders.clone(),
        identity.clone(),
        catalog.clone(),
        bus,
        notifier,
    );
    let stats = StatsService::new(orders.clone(), identity.clone(), catalog.clone());

    Harness {
        identity,
        catalog,
        orders,
        registry,
        ledger,
        stats,
    }
}

fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "hash".to_string(),
        first_name: username.to_string(),
        last_name: "Jones".to_string(),
        phone: None,
        address: Some("42 Main St".to_string()),
        role,
        active: true,
    }
}

#[tokio::test]
async fn completed_order_flows_into_provider_stats() {
    let h = harness();

    let c42 = h.identity.insert(new_user("c42", Role::Customer)).await.unwrap();
    let p3 = h.identity.insert(new_user("p3", Role::Provider)).await.unwrap();
    let s7 = h
        .catalog
        .insert_service(NewService {
            name: "Full Renovation".to_string(),
            description: None,
            price: Some(Decimal::new(150000, 2)), // 1500.00
            duration_minutes: Some(480),
            image_url: None,
            category_id: 1,
            provider_id: Some(p3.id),
            active: true,
        })
        .await
        .unwrap();

    let scheduled = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let order = h
        .ledger
        .create_order(
            c42.id,
            PlaceOrder {
                service_id: s7.id,
                scheduled_at: Some(scheduled),
                address: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, Decimal::new(150000, 2));
    assert_eq!(order.provider_id, Some(p3.id));
    assert_eq!(order.scheduled_at, scheduled);

    // The assigned provider completes the order.
    let done = h
        .ledger
        .update_status(order.id, OrderStatus::Completed, Some(p3.id))
        .await
        .unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert!(done.completed_at.is_some());

    let stats = h.stats.provider_stats(p3.id).await.unwrap();
    assert_eq!(stats.completed_orders, 1);
    assert_eq!(stats.total_revenue, Decimal::new(150000, 2));
    assert_eq!(stats.average_order_value, Decimal::new(150000, 2));
    assert_eq!(stats.orders_by_service.get("Full Renovation"), Some(&1));
    assert_eq!(stats.total_services, 1);
}

#[tokio::test]
async fn foreign_provider_is_rejected() {
    let h = harness();

    let customer = h.identity.insert(new_user("cust", Role::Customer)).await.unwrap();
    let p3 = h.identity.insert(new_user("p3", Role::Provider)).await.unwrap();
    let p9 = h.identity.insert(new_user("p9", Role::Provider)).await.unwrap();
    let svc = h
        .catalog
        .insert_service(NewService {
            name: "Cleaning".to_string(),
            description: None,
            price: Some(Decimal::new(8000, 2)),
            duration_minutes: Some(120),
            image_url: None,
            category_id: 1,
            provider_id: Some(p3.id),
            active: true,
        })
        .await
        .unwrap();

    let order = h
        .ledger
        .create_order(
            customer.id,
            PlaceOrder {
                service_id: svc.id,
                scheduled_at: Some(Utc::now()),
                address: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = h
        .ledger
        .update_status(order.id, OrderStatus::Confirmed, Some(p9.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotOwner { .. }));

    // State is untouched by the failed update.
    let unchanged = h.orders.find(order.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, OrderStatus::Pending);
}

#[tokio::test]
async fn delete_of_unknown_order_changes_nothing() {
    let h = harness();

    let customer = h.identity.insert(new_user("cust", Role::Customer)).await.unwrap();
    let svc = h
        .catalog
        .insert_service(NewService {
            name: "Repair".to_string(),
            description: None,
            price: Some(Decimal::new(5000, 2)),
            duration_minutes: None,
            image_url: None,
            category_id: 1,
            provider_id: None,
            active: true,
        })
        .await
        .unwrap();
    h.ledger
        .create_order(
            customer.id,
            PlaceOrder {
                service_id: svc.id,
                scheduled_at: Some(Utc::now()),
                address: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = h.ledger.delete(9999).await.unwrap_err();
    assert!(matches!(err, LedgerError::OrderNotFound(9999)));
    assert_eq!(h.orders.count().await.unwrap(), 1);
}

#[tokio::test]
async fn order_event_reaches_connected_customer() {
    let h = harness();

    let customer = h.identity.insert(new_user("cust", Role::Customer)).await.unwrap();
    let svc = h
        .catalog
        .insert_service(NewService {
            name: "Tutoring".to_string(),
            description: None,
            price: Some(Decimal::new(3000, 2)),
            duration_minutes: Some(60),
            image_url: None,
            category_id: 1,
            provider_id: None,
            active: true,
        })
        .await
        .unwrap();

    // Simulate an open websocket for the customer.
    let (tx, mut rx) = mpsc::unbounded_channel();
    h.registry.add(customer.id, tx);

    h.ledger
        .create_order(
            customer.id,
            PlaceOrder {
                service_id: svc.id,
                scheduled_at: Some(Utc::now()),
                address: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Direct ORDER_CREATED notification arrives synchronously.
    let direct = rx.recv().await.unwrap();
    assert_eq!(direct.kind, "ORDER_CREATED");

    // The event consumer bridges the queued event into an "Order Update"
    // notification shortly after.
    let bridged = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for bridged event")
        .unwrap();
    assert_eq!(bridged.kind, "ORDER_PENDING");
    assert_eq!(bridged.title, "Order Update");
}
