//! User endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::gateway::types::{UpdateRoleRequest, UpdateUserRequest};
use crate::models::User;
use crate::users::UpdateUser;

/// GET /api/users (administrators)
pub async fn get_all_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<User>> {
    user.require_admin()?;
    let users = state.users.all().await?;
    ok(users)
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<User> {
    let me = state.users.by_id(user.user_id).await?;
    ok(me)
}

/// GET /api/users/{id}
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    let found = state.users.by_id(id).await?;
    ok(found)
}

/// GET /api/users/username/{username} (administrators)
pub async fn get_user_by_username(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> ApiResult<User> {
    user.require_admin()?;
    let found = state.users.by_username(&username).await?;
    ok(found)
}

/// PUT /api/users/{id} - self or admin
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    if user.user_id != id {
        user.require_admin()?;
    }
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let updated = state
        .users
        .update(
            id,
            UpdateUser {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                phone: req.phone,
                address: req.address,
            },
        )
        .await?;
    ok(updated)
}

/// PUT /api/users/{id}/role (administrators)
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

/// DELETE /api/users/{id} (administrators)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.users.delete(id).await?;
    ok(())
}
