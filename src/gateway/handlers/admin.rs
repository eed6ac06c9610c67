//! Administrative endpoints
//!
//! Everything here is admin-gated. Order mutations run through the same
//! ledger as the public surface; the status update uses the unchecked
//! variant (no provider ownership check).

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::catalog::{ServiceInput, ServiceView};
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::gateway::types::{
    ActiveFlagRequest, AdminCreateOrderRequest, CreateUserRequest, UpdateOrderStatusRequest,
    UpdateRoleRequest,
};
use crate::ledger::{OrderView, PlaceOrder};
use crate::models::User;
use crate::stats::PlatformStats;
use crate::users::CreateUser;

/// Platform-wide statistics
///
/// GET /api/admin/stats
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform statistics"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_platform_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<PlatformStats> {
    user.require_admin()?;
    let stats = state.stats.platform_stats().await?;
    ok(stats)
}

// ----------------------------------------------------------------------
// Users
// ----------------------------------------------------------------------

/// GET /api/admin/users
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<User>> {
    user.require_admin()?;
    let users = state.users.all().await?;
    ok(users)
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<User> {
    user.require_admin()?;
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let created = state
        .users
        .create(CreateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            address: req.address,
            role: req.role,
            active: req.active,
        })
        .await?;
    ok(created)
}

/// PUT /api/admin/users/{id}/status
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<ActiveFlagRequest>,
) -> ApiResult<User> {
    user.require_admin()?;
    let updated = state.users.set_active(id, req.active).await?;
    ok(updated)
}

/// PUT /api/admin/users/{id}/role
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<User> {
    user.require_admin()?;
    let updated = state.users.update_role(id, req.role).await?;
    ok(updated)
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.users.delete(id).await?;
    ok(())
}

// ----------------------------------------------------------------------
// Services
// ----------------------------------------------------------------------

/// GET /api/admin/services - inactive included
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<ServiceView>> {
    user.require_admin()?;
    let services = state.catalog.all_services().await?;
    ok(services)
}

/// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<ServiceInput>,
) -> ApiResult<ServiceView> {
    user.require_admin()?;
    let service = state.catalog.create_service(req).await?;
    ok(service)
}

/// PUT /api/admin/services/{id}/status
pub async fn update_service_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<ActiveFlagRequest>,
) -> ApiResult<ServiceView> {
    user.require_admin()?;
    let service = state.catalog.set_service_active(id, req.active).await?;
    ok(service)
}

/// DELETE /api/admin/services/{id} - hard delete
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.catalog.delete_service(id).await?;
    ok(())
}

// ----------------------------------------------------------------------
// Orders
// ----------------------------------------------------------------------

/// GET /api/admin/orders
pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<OrderView>> {
    user.require_admin()?;
    let orders = state.ledger.all().await?;
    ok(orders)
}

/// POST /api/admin/orders - place an order on behalf of a customer
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<AdminCreateOrderRequest>,
) -> ApiResult<OrderView> {
    user.require_admin()?;
    let view = state
        .ledger
        .create_order(
            req.customer_id,
            PlaceOrder {
                service_id: req.service_id,
                scheduled_at: req.scheduled_at,
                address: req.address,
                notes: req.notes,
            },
        )
        .await?;
    state.order_cache.invalidate_all();
    ok(view)
}

/// PUT /api/admin/orders/{id}/status - no ownership check
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderView> {
    user.require_admin()?;
    let view = state.ledger.update_status_unchecked(id, req.status).await?;
    state.order_cache.invalidate_all();
    ok(view)
}

/// DELETE /api/admin/orders/{id} - hard delete
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.ledger.delete(id).await?;
    state.order_cache.invalidate_all();
    ok(())
}
