//! servhub gateway binary
//!
//! Loads config, initializes logging, wires the stores (Postgres when
//! configured, in-memory otherwise), starts the event consumer and serves
//! the HTTP gateway.

use anyhow::Result;
use std::sync::Arc;

use servhub::auth::AuthService;
use servhub::cache::OrderReadCache;
use servhub::catalog::CatalogService;
use servhub::config::AppConfig;
use servhub::events::{self, EventBus};
use servhub::gateway::{self, state::AppState};
use servhub::ledger::OrderLedger;
use servhub::logging::init_logging;
use servhub::notify::{ConnectionRegistry, NotificationSink, WsNotifier};
use servhub::reviews::ReviewService;
use servhub::stats::StatsService;
use servhub::store::{
    self, CatalogStore, IdentityStore, MemoryCatalogStore, MemoryIdentityStore, MemoryOrderStore,
    MemoryReviewStore, OrderStore, PgCatalogStore, PgIdentityStore, PgOrderStore, PgReviewStore,
    ReviewStore,
};
use servhub::users::UserService;

struct Stores {
    identity: Arc<dyn IdentityStore>,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    reviews: Arc<dyn ReviewStore>,
}

async fn build_stores(config: &AppConfig) -> Result<Stores> {
    match &config.postgres_url {
        Some(url) => {
            let pool = store::postgres::connect(url).await?;
            store::schema::init_schema(&pool).await?;
            Ok(Stores {
                identity: Arc::new(PgIdentityStore::new(pool.clone())),
                catalog: Arc::new(PgCatalogStore::new(pool.clone())),
                orders: Arc::new(PgOrderStore::new(pool.clone())),
                reviews: Arc::new(PgReviewStore::new(pool)),
            })
        }
        None => {
            tracing::warn!("no postgres_url configured, using in-memory stores");
            Ok(Stores {
                identity: Arc::new(MemoryIdentityStore::new()),
                catalog: Arc::new(MemoryCatalogStore::new()),
                orders: Arc::new(MemoryOrderStore::new()),
                reviews: Arc::new(MemoryReviewStore::new()),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::args().nth(1).unwrap_or_else(|| "dev".to_string());
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env = %env, "starting servhub");

    let stores = build_stores(&config).await?;

    let connections = Arc::new(ConnectionRegistry::new());
    let notifier: Arc<dyn NotificationSink> = Arc::new(WsNotifier::new(connections.clone()));

    let bus = Arc::new(EventBus::new(config.events.queue_size));
    let _consumer = events::spawn_consumer(bus.clone(), notifier.clone());

    let ledger = Arc::new(OrderLedger::new(
        stores.orders.clone(),
        stores.identity.clone(),
        stores.catalog.clone(),
        bus,
        notifier,
    ));
    let stats = Arc::new(StatsService::new(
        stores.orders.clone(),
        stores.identity.clone(),
        stores.catalog.clone(),
    ));
    let users = Arc::new(UserService::new(stores.identity.clone()));
    let catalog = Arc::new(CatalogService::new(
        stores.catalog.clone(),
        stores.identity.clone(),
        stores.reviews.clone(),
    ));
    let reviews = Arc::new(ReviewService::new(
        stores.reviews,
        stores.orders,
        stores.identity.clone(),
        stores.catalog,
    ));
    let auth = Arc::new(AuthService::new(
        stores.identity,
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    ));

    let state = Arc::new(AppState {
        ledger,
        stats,
        users,
        catalog,
        reviews,
        auth,
        order_cache: Arc::new(OrderReadCache::new(config.cache.ttl_seconds)),
        connections,
    });

    gateway::serve(state, &config.gateway.host, config.gateway.port).await
}
