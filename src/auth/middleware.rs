//! JWT middleware for the gateway

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::gateway::response::ApiError;
use crate::gateway::state::AppState;
use crate::models::Role;

/// Identity attached to a request after token verification
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Gate a handler on a role; admins pass every gate.
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("insufficient role"))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin only"))
        }
    }
}

/// Verify the bearer token and inject [`AuthenticatedUser`].
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid token format"))?;

    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;
    let role: Role = claims
        .role
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid token role"))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id, role });
    Ok(next.run(request).await)
}
