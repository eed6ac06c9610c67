//! In-memory store implementations
//!
//! DashMap-backed, used by the test suite and for running the gateway
//! without a database. Ids come from per-store atomic counters; each
//! mutation replaces a whole record under its map entry, which gives the
//! single-record atomicity the ledger relies on.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::{Category, Order, OrderStatus, Review, Role, ServiceOffering, User};

use super::{
    CatalogStore, IdentityStore, NewCategory, NewOrder, NewReview, NewService, NewUser,
    OrderStore, ReviewStore, StoreError,
};

/// In-memory Identity Store
pub struct MemoryIdentityStore {
    users: DashMap<i64, User>,
    next_id: AtomicI64,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.iter().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.iter().any(|u| u.email == email))
    }

    async fn all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.len() as u64)
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, StoreError> {
        Ok(self.users.iter().filter(|u| u.role == role).count() as u64)
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            address: new.address,
            role: new.role,
            active: new.active,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.users.remove(&id).is_some())
    }
}

/// In-memory Catalog Store
pub struct MemoryCatalogStore {
    categories: DashMap<i64, Category>,
    services: DashMap<i64, ServiceOffering>,
    next_category_id: AtomicI64,
    next_service_id: AtomicI64,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            categories: DashMap::new(),
            services: DashMap::new(),
            next_category_id: AtomicI64::new(1),
            next_service_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.get(&id).map(|c| c.clone()))
    }

    async fn all_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self.categories.iter().map(|c| c.clone()).collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category, StoreError> {
        let id = self.next_category_id.fetch_add(1, Ordering::SeqCst);
        let category = Category {
            id,
            name: new.name,
            description: new.description,
            icon: new.icon,
        };
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> Result<Category, StoreError> {
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.categories.remove(&id).is_some())
    }

    async fn find_service(&self, id: i64) -> Result<Option<ServiceOffering>, StoreError> {
        Ok(self.services.get(&id).map(|s| s.clone()))
    }

    async fn all_services(&self) -> Result<Vec<ServiceOffering>, StoreError> {
        let mut services: Vec<ServiceOffering> = self.services.iter().map(|s| s.clone()).collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn active_services(&self) -> Result<Vec<ServiceOffering>, StoreError> {
        let mut services: Vec<ServiceOffering> = self
            .services
            .iter()
            .filter(|s| s.active)
            .map(|s| s.clone())
            .collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn services_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        let mut services: Vec<ServiceOffering> = self
            .services
            .iter()
            .filter(|s| s.category_id == category_id && s.active)
            .map(|s| s.clone())
            .collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn services_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        let mut services: Vec<ServiceOffering> = self
            .services
            .iter()
            .filter(|s| s.provider_id == Some(provider_id))
            .map(|s| s.clone())
            .collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn count_services(&self) -> Result<u64, StoreError> {
        Ok(self.services.len() as u64)
    }

    async fn insert_service(&self, new: NewService) -> Result<ServiceOffering, StoreError> {
        let id = self.next_service_id.fetch_add(1, Ordering::SeqCst);
        let service = ServiceOffering {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            duration_minutes: new.duration_minutes,
            image_url: new.image_url,
            category_id: new.category_id,
            provider_id: new.provider_id,
            active: new.active,
        };
        self.services.insert(id, service.clone());
        Ok(service)
    }

    async fn update_service(
        &self,
        service: ServiceOffering,
    ) -> Result<ServiceOffering, StoreError> {
        self.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn delete_service(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.services.remove(&id).is_some())
    }
}

/// In-memory Order Store
pub struct MemoryOrderStore {
    orders: DashMap<i64, Order>,
    next_id: AtomicI64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find(&self, id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.iter().map(|o| o.clone()).collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn by_customer(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .map(|o| o.clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.provider_id == Some(provider_id))
            .map(|o| o.clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.orders.len() as u64)
    }

    async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StoreError> {
        Ok(self.orders.iter().filter(|o| o.status == status).count() as u64)
    }

    async fn insert(&self, new: NewOrder) -> Result<Order, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            customer_id: new.customer_id,
            service_id: new.service_id,
            provider_id: new.provider_id,
            scheduled_at: new.scheduled_at,
            address: new.address,
            notes: new.notes,
            status: new.status,
            total_price: new.total_price,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.orders.remove(&id).is_some())
    }
}

/// In-memory Review Store
pub struct MemoryReviewStore {
    reviews: DashMap<i64, Review>,
    next_id: AtomicI64,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self {
            reviews: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn find(&self, id: i64) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn all(&self) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self.reviews.iter().map(|r| r.clone()).collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| r.provider_id == Some(provider_id))
            .map(|r| r.clone())
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn by_service(&self, service_id: i64) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| r.service_id == service_id)
            .map(|r| r.clone())
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn by_order(&self, order_id: i64) -> Result<Option<Review>, StoreError> {
        Ok(self
            .reviews
            .iter()
            .find(|r| r.order_id == order_id)
            .map(|r| r.clone()))
    }

    async fn insert(&self, new: NewReview) -> Result<Review, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let review = Review {
            id,
            order_id: new.order_id,
            customer_id: new.customer_id,
            provider_id: new.provider_id,
            service_id: new.service_id,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        };
        self.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn update(&self, review: Review) -> Result<Review, StoreError> {
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.reviews.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
            address: Some("1 Main St".to_string()),
            role,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_identity_store_lookup_and_counts() {
        let store = MemoryIdentityStore::new();
        let alice = store.insert(new_user("alice", Role::Customer)).await.unwrap();
        store.insert(new_user("bob", Role::Provider)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.count_by_role(Role::Customer).await.unwrap(), 1);
        assert_eq!(store.count_by_role(Role::Admin).await.unwrap(), 0);
        assert!(store.exists_by_username("alice").await.unwrap());
        assert!(!store.exists_by_username("carol").await.unwrap());

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);

        assert!(store.delete(alice.id).await.unwrap());
        assert!(!store.delete(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_order_store_filters() {
        let store = MemoryOrderStore::new();
        for (customer, status) in [
            (1, OrderStatus::Pending),
            (1, OrderStatus::Completed),
            (2, OrderStatus::Pending),
        ] {
            store
                .insert(NewOrder {
                    customer_id: customer,
                    service_id: 7,
                    provider_id: Some(3),
                    scheduled_at: Utc::now(),
                    address: None,
                    notes: None,
                    status,
                    total_price: Decimal::new(1000, 2),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.by_customer(1).await.unwrap().len(), 2);
        assert_eq!(store.by_provider(3).await.unwrap().len(), 3);
        assert_eq!(
            store.count_by_status(OrderStatus::Pending).await.unwrap(),
            2
        );
        assert_eq!(store.by_status(OrderStatus::Completed).await.unwrap().len(), 1);
    }
}
