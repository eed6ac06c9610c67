use std::sync::Arc;

use crate::auth::AuthService;
use crate::cache::OrderReadCache;
use crate::catalog::CatalogService;
use crate::ledger::OrderLedger;
use crate::notify::ConnectionRegistry;
use crate::reviews::ReviewService;
use crate::stats::StatsService;
use crate::users::UserService;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<OrderLedger>,
    pub stats: Arc<StatsService>,
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
    pub auth: Arc<AuthService>,
    /// Read-through cache in front of ledger reads; dropped on every
    /// order mutation.
    pub order_cache: Arc<OrderReadCache>,
    /// Websocket notification connections.
    pub connections: Arc<ConnectionRegistry>,
}
