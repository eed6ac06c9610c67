//! API response envelope and error mapping
//!
//! Every endpoint returns `ApiResponse<T>`: code 0 on success, a stable
//! numeric error code otherwise. Service-layer errors convert into
//! `ApiError`, which carries the HTTP status alongside the code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::ledger::LedgerError;
use crate::reviews::ReviewError;
use crate::users::UserError;

/// Unified response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 0 for success, non-zero error code otherwise
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const VALIDATION_FAILED: i32 = 1002;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Error as returned to clients
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error_codes::FORBIDDEN, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, error_codes::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            message,
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_FAILED,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.message));
        (self.status, body).into_response()
    }
}

/// Handler result alias
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Success helper
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::OrderNotFound(_)
            | LedgerError::CustomerNotFound(_)
            | LedgerError::ServiceNotFound(_) => ApiError::not_found(err.to_string()),
            LedgerError::MissingSchedule | LedgerError::MissingPrice(_) => {
                ApiError::bad_request(err.to_string())
            }
            LedgerError::NotOwner { .. } => ApiError::forbidden(err.to_string()),
            LedgerError::Store(e) => {
                tracing::error!(error = %e, "store error in order path");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::UsernameTaken | AuthError::EmailTaken => {
                ApiError::conflict(err.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::AccountDisabled => ApiError::forbidden(err.to_string()),
            AuthError::Hashing(_) | AuthError::TokenEncoding(_) | AuthError::Store(_) => {
                tracing::error!(error = %err, "auth failure");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match &err {
            UserError::NotFound(_) | UserError::NotFoundByName(_) => {
                ApiError::not_found(err.to_string())
            }
            UserError::UsernameTaken | UserError::EmailTaken => {
                ApiError::conflict(err.to_string())
            }
            UserError::Hashing(_) | UserError::Store(_) => {
                tracing::error!(error = %err, "user service failure");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::CategoryNotFound(_)
            | CatalogError::ServiceNotFound(_)
            | CatalogError::ProviderNotFound(_) => ApiError::not_found(err.to_string()),
            CatalogError::Store(e) => {
                tracing::error!(error = %e, "store error in catalog path");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match &err {
            ReviewError::NotFound(_) | ReviewError::OrderNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            ReviewError::NotYourOrder => ApiError::forbidden(err.to_string()),
            ReviewError::OrderNotCompleted => ApiError::bad_request(err.to_string()),
            ReviewError::AlreadyReviewed(_) => ApiError::conflict(err.to_string()),
            ReviewError::Store(e) => {
                tracing::error!(error = %e, "store error in review path");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        tracing::error!(error = %err, "store error");
        ApiError::internal("internal error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let err: ApiError = LedgerError::OrderNotFound(5).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::NOT_FOUND);

        let err: ApiError = LedgerError::MissingSchedule.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = LedgerError::NotOwner {
            order_id: 1,
            acting: 9,
            assigned: 3,
        }
        .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: ApiError = AuthError::UsernameTaken.into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = ReviewError::AlreadyReviewed(1).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
