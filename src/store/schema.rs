//! Postgres schema bootstrap
//!
//! Idempotent CREATE TABLE statements run at startup when the Postgres
//! backend is configured. Not a migration system; additive changes only.

use sqlx::PgPool;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    phone         TEXT,
    address       TEXT,
    role          TEXT NOT NULL DEFAULT 'CUSTOMER',
    active        BOOLEAN NOT NULL DEFAULT TRUE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    icon        TEXT
)
"#;

const CREATE_SERVICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS services (
    id               BIGSERIAL PRIMARY KEY,
    name             TEXT NOT NULL,
    description      TEXT,
    price            NUMERIC(12,2),
    duration_minutes INTEGER,
    image_url        TEXT,
    category_id      BIGINT NOT NULL REFERENCES categories(id),
    provider_id      BIGINT REFERENCES users(id),
    active           BOOLEAN NOT NULL DEFAULT TRUE
)
"#;

const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id           BIGSERIAL PRIMARY KEY,
    customer_id  BIGINT NOT NULL REFERENCES users(id),
    service_id   BIGINT NOT NULL REFERENCES services(id),
    provider_id  BIGINT REFERENCES users(id),
    scheduled_at TIMESTAMPTZ NOT NULL,
    address      TEXT,
    notes        TEXT,
    status       TEXT NOT NULL DEFAULT 'PENDING',
    total_price  NUMERIC(12,2) NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at TIMESTAMPTZ
)
"#;

const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id          BIGSERIAL PRIMARY KEY,
    order_id    BIGINT NOT NULL UNIQUE REFERENCES orders(id) ON DELETE CASCADE,
    customer_id BIGINT NOT NULL REFERENCES users(id),
    provider_id BIGINT REFERENCES users(id),
    service_id  BIGINT NOT NULL REFERENCES services(id),
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment     TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_ORDER_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id);
CREATE INDEX IF NOT EXISTS idx_orders_provider ON orders(provider_id);
CREATE INDEX IF NOT EXISTS idx_orders_status   ON orders(status)
"#;

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("initializing postgres schema");
    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_CATEGORIES_TABLE).execute(pool).await?;
    sqlx::query(CREATE_SERVICES_TABLE).execute(pool).await?;
    sqlx::query(CREATE_ORDERS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_REVIEWS_TABLE).execute(pool).await?;
    for stmt in CREATE_ORDER_INDEXES.split(';') {
        let stmt = stmt.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt).execute(pool).await?;
        }
    }
    Ok(())
}
