//! Registration and login endpoints

use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;

/// Register a new customer account
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, token issued"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Username or email already exists")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let response = state.auth.register(req).await?;
    ok(response)
}

/// Log in and receive a JWT
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "Account disabled")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.auth.login(req).await?;
    ok(response)
}
