//! Order endpoints
//!
//! Reads on the hot paths (all, by id, by status) go through the
//! read-through cache; every mutation drops it wholesale before returning.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::cache::{status_key, KEY_ALL};
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::gateway::types::UpdateOrderStatusRequest;
use crate::ledger::{OrderView, PlaceOrder};
use crate::models::{OrderStatus, Role};
use crate::stats::ProviderStats;

/// Place an order
///
/// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body(content = String, description = "Order request JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Order created"),
        (status = 400, description = "Missing schedule or service price"),
        (status = 404, description = "Customer or service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<PlaceOrder>,
) -> ApiResult<OrderView> {
    let view = state.ledger.create_order(user.user_id, req).await?;
    state.order_cache.invalidate_all();
    ok(view)
}

/// List every order (administrators)
///
/// GET /api/orders
pub async fn get_all_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<OrderView>> {
    user.require_admin()?;
    if let Some(views) = state.order_cache.get_list(KEY_ALL) {
        return ok(views);
    }
    let views = state.ledger.all().await?;
    state.order_cache.put_list(KEY_ALL.to_string(), views.clone());
    ok(views)
}

/// Fetch one order
///
/// GET /api/orders/{id}
pub async fn get_order_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<OrderView> {
    if let Some(view) = state.order_cache.get_order(id) {
        return ok(view);
    }
    let view = state.ledger.by_id(id).await?;
    state.order_cache.put_order(view.clone());
    ok(view)
}

/// The calling customer's orders
///
/// GET /api/orders/my-orders
pub async fn get_my_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<OrderView>> {
    let views = state.ledger.by_customer(user.user_id).await?;
    ok(views)
}

/// The calling provider's orders
///
/// GET /api/orders/my-provider-orders
pub async fn get_my_provider_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<OrderView>> {
    user.require(Role::Provider)?;
    let views = state.ledger.by_provider(user.user_id).await?;
    ok(views)
}

/// Orders for one customer (administrators)
///
/// GET /api/orders/customer/{customerId}
pub async fn get_orders_by_customer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(customer_id): Path<i64>,
) -> ApiResult<Vec<OrderView>> {
    user.require_admin()?;
    let views = state.ledger.by_customer(customer_id).await?;
    ok(views)
}

/// Orders for one provider (administrators)
///
/// GET /api/orders/provider/{providerId}
pub async fn get_orders_by_provider(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(provider_id): Path<i64>,
) -> ApiResult<Vec<OrderView>> {
    user.require_admin()?;
    let views = state.ledger.by_provider(provider_id).await?;
    ok(views)
}

/// Orders in one status (administrators)
///
/// GET /api/orders/status/{status}
pub async fn get_orders_by_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(status): Path<String>,
) -> ApiResult<Vec<OrderView>> {
    user.require_admin()?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e: String| ApiError::bad_request(e))?;

    let key = status_key(status);
    if let Some(views) = state.order_cache.get_list(&key) {
        return ok(views);
    }
    let views = state.ledger.by_status(status).await?;
    state.order_cache.put_list(key, views.clone());
    ok(views)
}

/// Update an order's status
///
/// PUT /api/orders/{id}/status
///
/// Providers may only touch their own orders; the ownership check happens
/// in the ledger, keyed off the acting provider id passed here.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = i64, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 403, description = "Order belongs to another provider"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderView> {
    user.require(Role::Provider)?;
    let acting_provider = (user.role == Role::Provider).then_some(user.user_id);
    let view = state
        .ledger
        .update_status(id, req.status, acting_provider)
        .await?;
    state.order_cache.invalidate_all();
    ok(view)
}

/// Cancel an order
///
/// DELETE /api/orders/{id}
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.ledger.cancel(id).await?;
    state.order_cache.invalidate_all();
    ok(())
}

/// Statistics for the calling provider
///
/// GET /api/orders/provider/stats
#[utoipa::path(
    get,
    path = "/api/orders/provider/stats",
    responses(
        (status = 200, description = "Provider statistics"),
        (status = 403, description = "Caller is not a provider")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_provider_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<ProviderStats> {
    user.require(Role::Provider)?;
    let stats = state.stats.provider_stats(user.user_id).await?;
    ok(stats)
}
