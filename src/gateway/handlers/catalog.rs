//! Category and service endpoints
//!
//! Listings are public; mutations are provider/admin. A provider may only
//! touch their own services.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::catalog::{CategoryInput, CategoryView, ServiceInput, ServiceView};
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::models::Role;

// ----------------------------------------------------------------------
// Categories
// ----------------------------------------------------------------------

/// GET /api/categories
pub async fn get_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CategoryView>> {
    let categories = state.catalog.categories().await?;
    ok(categories)
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<CategoryView> {
    let category = state.catalog.category(id).await?;
    ok(category)
}

/// POST /api/categories (administrators)
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CategoryInput>,
) -> ApiResult<CategoryView> {
    user.require_admin()?;
    let category = state.catalog.create_category(req).await?;
    ok(category)
}

/// PUT /api/categories/{id} (administrators)
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryInput>,
) -> ApiResult<CategoryView> {
    user.require_admin()?;
    let category = state.catalog.update_category(id, req).await?;
    ok(category)
}

/// DELETE /api/categories/{id} (administrators)
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.catalog.delete_category(id).await?;
    ok(())
}

// ----------------------------------------------------------------------
// Services
// ----------------------------------------------------------------------

/// GET /api/services - active services only
pub async fn get_services(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ServiceView>> {
    let services = state.catalog.services().await?;
    ok(services)
}

/// GET /api/services/{id}
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ServiceView> {
    let service = state.catalog.service(id).await?;
    ok(service)
}

/// GET /api/services/category/{categoryId}
pub async fn get_services_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> ApiResult<Vec<ServiceView>> {
    let services = state.catalog.services_by_category(category_id).await?;
    ok(services)
}

/// GET /api/services/provider/{providerId}
pub async fn get_services_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<i64>,
) -> ApiResult<Vec<ServiceView>> {
    let services = state.catalog.services_by_provider(provider_id).await?;
    ok(services)
}

/// GET /api/services/my-services (providers)
pub async fn get_my_services(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<ServiceView>> {
    user.require(Role::Provider)?;
    let services = state.catalog.services_by_provider(user.user_id).await?;
    ok(services)
}

/// POST /api/services (providers and administrators)
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(mut req): Json<ServiceInput>,
) -> ApiResult<ServiceView> {
    user.require(Role::Provider)?;
    // Providers always create under their own id.
    if user.role == Role::Provider {
        req.provider_id = Some(user.user_id);
    }
    let service = state.catalog.create_service(req).await?;
    ok(service)
}

/// PUT /api/services/{id}
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<ServiceInput>,
) -> ApiResult<ServiceView> {
    user.require(Role::Provider)?;
    require_service_owner(&state, &user, id).await?;
    let service = state.catalog.update_service(id, req).await?;
    ok(service)
}

/// DELETE /api/services/{id} - soft delete
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Provider)?;
    require_service_owner(&state, &user, id).await?;
    state.catalog.deactivate_service(id).await?;
    ok(())
}

/// Providers may only mutate their own services; admins skip the check.
async fn require_service_owner(
    state: &AppState,
    user: &AuthenticatedUser,
    service_id: i64,
) -> Result<(), ApiError> {
    if user.role != Role::Provider {
        return Ok(());
    }
    let service = state.catalog.service(service_id).await?;
    if service.provider_id != Some(user.user_id) {
        return Err(ApiError::forbidden(
            "providers can only modify their own services",
        ));
    }
    Ok(())
}
