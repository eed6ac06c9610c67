//! Statistics Aggregator - derived provider and platform rollups
//!
//! Read-only. Every call recomputes from the current store snapshot, so a
//! concurrent order mutation may or may not be visible (read-committed, not
//! snapshot-isolated). Revenue counts COMPLETED orders only.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{OrderStatus, Role};
use crate::store::{CatalogStore, IdentityStore, OrderStore, StoreError};

/// Per-provider rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStats {
    pub total_services: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
    pub confirmed_orders: u64,
    pub in_progress_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub orders_by_status: HashMap<String, u64>,
    /// Service name -> count of COMPLETED orders; services with none absent.
    pub orders_by_service: HashMap<String, u64>,
}

/// Platform-wide rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_customers: u64,
    pub total_providers: u64,
    pub total_services: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub total_revenue: Decimal,
    /// Every status appears, zero counts included.
    pub orders_by_status: HashMap<String, u64>,
    /// Every role appears, zero counts included.
    pub users_by_role: HashMap<String, u64>,
}

/// The Statistics Aggregator
pub struct StatsService {
    orders: Arc<dyn OrderStore>,
    identity: Arc<dyn IdentityStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl StatsService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        identity: Arc<dyn IdentityStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            orders,
            identity,
            catalog,
        }
    }

    /// Rollup over one provider's services and orders.
    pub async fn provider_stats(&self, provider_id: i64) -> Result<ProviderStats, StoreError> {
        let total_services = self.catalog.services_by_provider(provider_id).await?.len() as u64;
        let orders = self.orders.by_provider(provider_id).await?;

        let count_with = |status: OrderStatus| -> u64 {
            orders.iter().filter(|o| o.status == status).count() as u64
        };

        let completed_orders = count_with(OrderStatus::Completed);

        let total_revenue: Decimal = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| o.total_price)
            .sum();

        // Guard the division: a provider with no completed orders has an
        // average of zero, not an error.
        let average_order_value = if completed_orders > 0 {
            (total_revenue / Decimal::from(completed_orders))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        let mut orders_by_status = HashMap::new();
        for status in OrderStatus::ALL {
            orders_by_status.insert(status.as_str().to_string(), count_with(status));
        }

        let mut orders_by_service: HashMap<String, u64> = HashMap::new();
        for order in orders.iter().filter(|o| o.status == OrderStatus::Completed) {
            if let Some(service) = self.catalog.find_service(order.service_id).await? {
                *orders_by_service.entry(service.name).or_insert(0) += 1;
            }
        }

        Ok(ProviderStats {
            total_services,
            total_orders: orders.len() as u64,
            pending_orders: count_with(OrderStatus::Pending),
            confirmed_orders: count_with(OrderStatus::Confirmed),
            in_progress_orders: count_with(OrderStatus::InProgress),
            completed_orders,
            cancelled_orders: count_with(OrderStatus::Cancelled),
            total_revenue,
            average_order_value,
            orders_by_status,
            orders_by_service,
        })
    }

    /// Rollup across all users, services and orders.
    pub async fn platform_stats(&self) -> Result<PlatformStats, StoreError> {
        let total_users = self.identity.count().await?;
        let total_customers = self.identity.count_by_role(Role::Customer).await?;
        let total_providers = self.identity.count_by_role(Role::Provider).await?;
        let total_services = self.catalog.count_services().await?;

        let total_orders = self.orders.count().await?;
        let pending_orders = self.orders.count_by_status(OrderStatus::Pending).await?;
        let completed_orders = self.orders.count_by_status(OrderStatus::Completed).await?;
        let cancelled_orders = self.orders.count_by_status(OrderStatus::Cancelled).await?;

        let total_revenue: Decimal = self
            .orders
            .all()
            .await?
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| o.total_price)
            .sum();

        let mut orders_by_status = HashMap::new();
        for status in OrderStatus::ALL {
            orders_by_status.insert(
                status.as_str().to_string(),
                self.orders.count_by_status(status).await?,
            );
        }

        let mut users_by_role = HashMap::new();
        for role in Role::ALL {
            users_by_role.insert(
                role.as_str().to_string(),
                self.identity.count_by_role(role).await?,
            );
        }

        Ok(PlatformStats {
            total_users,
            total_customers,
            total_providers,
            total_services,
            total_orders,
            pending_orders,
            completed_orders,
            cancelled_orders,
            total_revenue,
            orders_by_status,
            users_by_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{fixture, service, user};
    use crate::ledger::PlaceOrder;
    use crate::models::Role;
    use chrono::Utc;

    fn place(service_id: i64) -> PlaceOrder {
        PlaceOrder {
            service_id,
            scheduled_at: Some(Utc::now()),
            address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_provider_stats_zero_completed_has_zero_average() {
        let f = fixture().await;
        let provider = f.identity.insert(user("p1", Role::Provider, None)).await.unwrap();
        let stats = StatsService::new(f.orders.clone(), f.identity.clone(), f.catalog.clone());

        let s = stats.provider_stats(provider.id).await.unwrap();
        assert_eq!(s.total_orders, 0);
        assert_eq!(s.total_revenue, Decimal::ZERO);
        assert_eq!(s.average_order_value, Decimal::ZERO);
        assert!(s.orders_by_service.is_empty());
        // The status breakdown still carries all five statuses.
        assert_eq!(s.orders_by_status.len(), 5);
    }

    #[tokio::test]
    async fn test_provider_status_counts_sum_to_total() {
        let f = fixture().await;
        let customer = f.identity.insert(user("c1", Role::Customer, None)).await.unwrap();
        let provider = f.identity.insert(user("p1", Role::Provider, None)).await.unwrap();
        let svc = f
            .catalog
            .insert_service(service("Svc", Some(Decimal::new(2500, 2)), Some(provider.id)))
            .await
            .unwrap();

        let statuses = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        for status in statuses {
            let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();
            if status != OrderStatus::Pending {
                f.ledger.update_status(view.id, status, None).await.unwrap();
            }
        }

        let stats = StatsService::new(f.orders.clone(), f.identity.clone(), f.catalog.clone());
        let s = stats.provider_stats(provider.id).await.unwrap();

        assert_eq!(s.total_orders, 6);
        let sum: u64 = s.orders_by_status.values().sum();
        assert_eq!(sum, s.total_orders);
        assert_eq!(s.pending_orders, 1);
        assert_eq!(s.completed_orders, 2);
        assert_eq!(s.cancelled_orders, 1);
        assert_eq!(s.total_revenue, Decimal::new(5000, 2));
        assert_eq!(s.average_order_value, Decimal::new(2500, 2));
        assert_eq!(s.orders_by_service.get("Svc"), Some(&2));
    }

    #[tokio::test]
    async fn test_average_rounds_half_up() {
        let f = fixture().await;
        let customer = f.identity.insert(user("c1", Role::Customer, None)).await.unwrap();
        let provider = f.identity.insert(user("p1", Role::Provider, None)).await.unwrap();
        // 10.01 + 10.02 = 20.03; /2 = 10.015 -> rounds half-up to 10.02
        let a = f
            .catalog
            .insert_service(service("A", Some(Decimal::new(1001, 2)), Some(provider.id)))
            .await
            .unwrap();
        let b = f
            .catalog
            .insert_service(service("B", Some(Decimal::new(1002, 2)), Some(provider.id)))
            .await
            .unwrap();
        for svc in [a, b] {
            let view = f.ledger.create_order(customer.id, place(svc.id)).await.unwrap();
            f.ledger
                .update_status(view.id, OrderStatus::Completed, None)
                .await
                .unwrap();
        }

        let stats = StatsService::new(f.orders.clone(), f.identity.clone(), f.catalog.clone());
        let s = stats.provider_stats(provider.id).await.unwrap();
        assert_eq!(s.average_order_value, Decimal::new(1002, 2));
    }

    #[tokio::test]
    async fn test_platform_stats_breakdowns_cover_all_variants() {
        let f = fixture().await;
        f.identity.insert(user("c1", Role::Customer, None)).await.unwrap();
        f.identity.insert(user("p1", Role::Provider, None)).await.unwrap();
        f.identity.insert(user("a1", Role::Admin, None)).await.unwrap();

        let stats = StatsService::new(f.orders.clone(), f.identity.clone(), f.catalog.clone());
        let s = stats.platform_stats().await.unwrap();

        assert_eq!(s.total_users, 3);
        assert_eq!(s.total_customers, 1);
        assert_eq!(s.total_providers, 1);
        assert_eq!(s.total_orders, 0);
        assert_eq!(s.total_revenue, Decimal::ZERO);
        // Zero-count entries are present, not omitted.
        assert_eq!(s.orders_by_status.len(), 5);
        assert_eq!(s.orders_by_status.get("COMPLETED"), Some(&0));
        assert_eq!(s.users_by_role.len(), 3);
        assert_eq!(s.users_by_role.get("ADMIN"), Some(&1));
    }
}
