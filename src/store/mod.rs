//! Storage contracts for the marketplace collaborators
//!
//! The ledger and the CRUD services talk to these traits only; the concrete
//! backend is chosen at startup (DashMap-backed memory stores, or Postgres
//! via sqlx). Every mutating call is atomic with respect to the single
//! record it touches.

pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Category, Order, OrderStatus, Review, Role, ServiceOffering, User};

pub use memory::{MemoryCatalogStore, MemoryIdentityStore, MemoryOrderStore, MemoryReviewStore};
pub use postgres::{PgCatalogStore, PgIdentityStore, PgOrderStore, PgReviewStore};

/// Storage backend error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer parses (e.g. an unknown status string).
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Insert payload for a user record; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub active: bool,
}

/// Insert payload for a service offering.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub provider_id: Option<i64>,
    pub active: bool,
}

/// Insert payload for a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Insert payload for an order; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub service_id: i64,
    pub provider_id: Option<i64>,
    pub scheduled_at: DateTime<Utc>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub total_price: Decimal,
}

/// Insert payload for a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub order_id: i64,
    pub customer_id: i64,
    pub provider_id: Option<i64>,
    pub service_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

/// User records (the Identity Store collaborator)
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn all(&self) -> Result<Vec<User>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn count_by_role(&self, role: Role) -> Result<u64, StoreError>;
    async fn insert(&self, new: NewUser) -> Result<User, StoreError>;
    /// Save the full record; the caller fetched it first.
    async fn update(&self, user: User) -> Result<User, StoreError>;
    /// Returns false when no record with this id existed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Category and service records (the Catalog Store collaborator)
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError>;
    async fn all_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn insert_category(&self, new: NewCategory) -> Result<Category, StoreError>;
    async fn update_category(&self, category: Category) -> Result<Category, StoreError>;
    async fn delete_category(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_service(&self, id: i64) -> Result<Option<ServiceOffering>, StoreError>;
    /// Every service, inactive included (admin listings).
    async fn all_services(&self) -> Result<Vec<ServiceOffering>, StoreError>;
    async fn active_services(&self) -> Result<Vec<ServiceOffering>, StoreError>;
    /// Active services in a category.
    async fn services_by_category(&self, category_id: i64)
        -> Result<Vec<ServiceOffering>, StoreError>;
    async fn services_by_provider(&self, provider_id: i64)
        -> Result<Vec<ServiceOffering>, StoreError>;
    async fn count_services(&self) -> Result<u64, StoreError>;
    async fn insert_service(&self, new: NewService) -> Result<ServiceOffering, StoreError>;
    async fn update_service(&self, service: ServiceOffering)
        -> Result<ServiceOffering, StoreError>;
    async fn delete_service(&self, id: i64) -> Result<bool, StoreError>;
}

/// Order records (owned by the ledger; nothing else mutates them)
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Order>, StoreError>;
    async fn all(&self) -> Result<Vec<Order>, StoreError>;
    async fn by_customer(&self, customer_id: i64) -> Result<Vec<Order>, StoreError>;
    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Order>, StoreError>;
    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StoreError>;
    async fn insert(&self, new: NewOrder) -> Result<Order, StoreError>;
    async fn update(&self, order: Order) -> Result<Order, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Review records
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Review>, StoreError>;
    async fn all(&self) -> Result<Vec<Review>, StoreError>;
    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Review>, StoreError>;
    async fn by_service(&self, service_id: i64) -> Result<Vec<Review>, StoreError>;
    async fn by_order(&self, order_id: i64) -> Result<Option<Review>, StoreError>;
    async fn insert(&self, new: NewReview) -> Result<Review, StoreError>;
    async fn update(&self, review: Review) -> Result<Review, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}
