//! Postgres store implementations
//!
//! Plain sqlx queries with manual row mapping; enum columns are TEXT and
//! parse through the model FromStr impls. Single-record mutations ride on
//! single statements, which gives the per-order atomicity the ledger needs
//! without explicit transactions.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::models::{Category, Order, OrderStatus, Review, Role, ServiceOffering, User};

use super::{
    CatalogStore, IdentityStore, NewCategory, NewOrder, NewReview, NewService, NewUser,
    OrderStore, ReviewStore, StoreError,
};

/// Open the connection pool used by all Postgres stores.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    tracing::info!("postgres connection pool established");
    Ok(pool)
}

fn map_user(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone: row.get("phone"),
        address: row.get("address"),
        role: role.parse::<Role>().map_err(StoreError::Corrupt)?,
        active: row.get("active"),
        created_at: row.get("created_at"),
    })
}

fn map_order(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.get("status");
    Ok(Order {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        service_id: row.get("service_id"),
        provider_id: row.get("provider_id"),
        scheduled_at: row.get("scheduled_at"),
        address: row.get("address"),
        notes: row.get("notes"),
        status: status.parse::<OrderStatus>().map_err(StoreError::Corrupt)?,
        total_price: row.get("total_price"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
    })
}

fn map_service(row: &PgRow) -> ServiceOffering {
    ServiceOffering {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        duration_minutes: row.get("duration_minutes"),
        image_url: row.get("image_url"),
        category_id: row.get("category_id"),
        provider_id: row.get("provider_id"),
        active: row.get("active"),
    }
}

fn map_category(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        icon: row.get("icon"),
    }
}

fn map_review(row: &PgRow) -> Review {
    Review {
        id: row.get("id"),
        order_id: row.get("order_id"),
        customer_id: row.get("customer_id"),
        provider_id: row.get("provider_id"),
        service_id: row.get("service_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, phone, address, role, active, created_at";
const ORDER_COLUMNS: &str =
    "id, customer_id, service_id, provider_id, scheduled_at, address, notes, status, total_price, created_at, completed_at";
const SERVICE_COLUMNS: &str =
    "id, name, description, price, duration_minutes, image_url, category_id, provider_id, active";

/// Postgres-backed Identity Store
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_user).transpose()?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_user).transpose()?)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1) AS found")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("found"))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS found")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("found"))
    }

    async fn all(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_user).collect::<Result<_, _>>()?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO users
               (username, email, password_hash, first_name, last_name, phone, address, role, active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(new.role.as_str())
        .bind(new.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_user(&row)?)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"UPDATE users SET
               username = $2, email = $3, password_hash = $4, first_name = $5,
               last_name = $6, phone = $7, address = $8, role = $9, active = $10
               WHERE id = $1
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.role.as_str())
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_user(&row)?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed Catalog Store
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn services_where(
        &self,
        clause: &str,
        bind_id: Option<i64>,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        let sql = format!(
            "SELECT {} FROM services {} ORDER BY id",
            SERVICE_COLUMNS, clause
        );
        let mut query = sqlx::query(&sql);
        if let Some(id) = bind_id {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(map_service).collect())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, description, icon FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_category))
    }

    async fn all_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description, icon FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_category).collect())
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO categories (name, description, icon) VALUES ($1, $2, $3)
               RETURNING id, name, description, icon"#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.icon)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_category(&row))
    }

    async fn update_category(&self, category: Category) -> Result<Category, StoreError> {
        let row = sqlx::query(
            r#"UPDATE categories SET name = $2, description = $3, icon = $4 WHERE id = $1
               RETURNING id, name, description, icon"#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_category(&row))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_service(&self, id: i64) -> Result<Option<ServiceOffering>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM services WHERE id = $1",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_service))
    }

    async fn all_services(&self) -> Result<Vec<ServiceOffering>, StoreError> {
        self.services_where("", None).await
    }

    async fn active_services(&self) -> Result<Vec<ServiceOffering>, StoreError> {
        self.services_where("WHERE active", None).await
    }

    async fn services_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        self.services_where("WHERE category_id = $1 AND active", Some(category_id))
            .await
    }

    async fn services_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<ServiceOffering>, StoreError> {
        self.services_where("WHERE provider_id = $1", Some(provider_id))
            .await
    }

    async fn count_services(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM services")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn insert_service(&self, new: NewService) -> Result<ServiceOffering, StoreError> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO services
               (name, description, price, duration_minutes, image_url, category_id, provider_id, active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {}"#,
            SERVICE_COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.duration_minutes)
        .bind(&new.image_url)
        .bind(new.category_id)
        .bind(new.provider_id)
        .bind(new.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_service(&row))
    }

    async fn update_service(
        &self,
        service: ServiceOffering,
    ) -> Result<ServiceOffering, StoreError> {
        let row = sqlx::query(&format!(
            r#"UPDATE services SET
               name = $2, description = $3, price = $4, duration_minutes = $5,
               image_url = $6, category_id = $7, provider_id = $8, active = $9
               WHERE id = $1
               RETURNING {}"#,
            SERVICE_COLUMNS
        ))
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price)
        .bind(service.duration_minutes)
        .bind(&service.image_url)
        .bind(service.category_id)
        .bind(service.provider_id)
        .bind(service.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_service(&row))
    }

    async fn delete_service(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed Order Store
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn orders_where(
        &self,
        clause: &str,
        bind: OrderBind<'_>,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders {} ORDER BY id", ORDER_COLUMNS, clause);
        let mut query = sqlx::query(&sql);
        match bind {
            OrderBind::None => {}
            OrderBind::Id(id) => query = query.bind(id),
            OrderBind::Status(status) => query = query.bind(status.as_str()),
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(map_order).collect::<Result<_, _>>()?)
    }
}

enum OrderBind<'a> {
    None,
    Id(i64),
    Status(&'a OrderStatus),
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_order).transpose()?)
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        self.orders_where("", OrderBind::None).await
    }

    async fn by_customer(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        self.orders_where("WHERE customer_id = $1", OrderBind::Id(customer_id))
            .await
    }

    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Order>, StoreError> {
        self.orders_where("WHERE provider_id = $1", OrderBind::Id(provider_id))
            .await
    }

    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        self.orders_where("WHERE status = $1", OrderBind::Status(&status))
            .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn insert(&self, new: NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO orders
               (customer_id, service_id, provider_id, scheduled_at, address, notes, status, total_price)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {}"#,
            ORDER_COLUMNS
        ))
        .bind(new.customer_id)
        .bind(new.service_id)
        .bind(new.provider_id)
        .bind(new.scheduled_at)
        .bind(&new.address)
        .bind(&new.notes)
        .bind(new.status.as_str())
        .bind(new.total_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_order(&row)?)
    }

    async fn update(&self, order: Order) -> Result<Order, StoreError> {
        let row = sqlx::query(&format!(
            r#"UPDATE orders SET
               scheduled_at = $2, address = $3, notes = $4, status = $5, completed_at = $6
               WHERE id = $1
               RETURNING {}"#,
            ORDER_COLUMNS
        ))
        .bind(order.id)
        .bind(order.scheduled_at)
        .bind(&order.address)
        .bind(&order.notes)
        .bind(order.status.as_str())
        .bind(order.completed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_order(&row)?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed Review Store
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REVIEW_COLUMNS: &str =
    "id, order_id, customer_id, provider_id, service_id, rating, comment, created_at";

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn find(&self, id: i64) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_review))
    }

    async fn all(&self) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews ORDER BY id",
            REVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_review).collect())
    }

    async fn by_provider(&self, provider_id: i64) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE provider_id = $1 ORDER BY id",
            REVIEW_COLUMNS
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_review).collect())
    }

    async fn by_service(&self, service_id: i64) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE service_id = $1 ORDER BY id",
            REVIEW_COLUMNS
        ))
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_review).collect())
    }

    async fn by_order(&self, order_id: i64) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE order_id = $1",
            REVIEW_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_review))
    }

    async fn insert(&self, new: NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO reviews
               (order_id, customer_id, provider_id, service_id, rating, comment)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            REVIEW_COLUMNS
        ))
        .bind(new.order_id)
        .bind(new.customer_id)
        .bind(new.provider_id)
        .bind(new.service_id)
        .bind(new.rating)
        .bind(&new.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_review(&row))
    }

    async fn update(&self, review: Review) -> Result<Review, StoreError> {
        let row = sqlx::query(&format!(
            r#"UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1
               RETURNING {}"#,
            REVIEW_COLUMNS
        ))
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_review(&row))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema;

    // Requires a running Postgres; run with:
    //   DATABASE_URL=postgres://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_user_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        schema::init_schema(&pool).await.expect("schema init failed");

        let store = PgIdentityStore::new(pool);
        let user = store
            .insert(NewUser {
                username: format!("it_user_{}", chrono::Utc::now().timestamp_micros()),
                email: format!("it_{}@example.com", chrono::Utc::now().timestamp_micros()),
                password_hash: "hash".to_string(),
                first_name: "It".to_string(),
                last_name: "Test".to_string(),
                phone: None,
                address: None,
                role: Role::Customer,
                active: true,
            })
            .await
            .expect("insert failed");

        let found = store.find_by_id(user.id).await.expect("find failed");
        assert_eq!(found.map(|u| u.username), Some(user.username.clone()));

        assert!(store.delete(user.id).await.expect("delete failed"));
    }
}
