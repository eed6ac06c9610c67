//! Gateway request DTOs
//!
//! Validated at the edge with `validator`; service-layer payloads that need
//! no field validation (`PlaceOrder`, `CategoryInput`, `ServiceInput`) are
//! deserialized directly and not duplicated here.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{OrderStatus, Role};

/// Order status update body
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[schema(example = "CONFIRMED")]
    pub status: OrderStatus,
}

/// Admin order creation on behalf of a customer
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCreateOrderRequest {
    pub customer_id: i64,
    pub service_id: i64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Review creation body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    pub order_id: i64,
    #[validate(range(min = 1, max = 5))]
    #[schema(example = 5)]
    pub rating: i32,
    pub comment: Option<String>,
}

/// Review update body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub comment: Option<String>,
}

/// Admin user creation body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Profile update body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Role change body
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Active-flag toggle body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActiveFlagRequest {
    pub active: bool,
}

/// Websocket auth carried as a query parameter (browsers cannot set
/// headers on upgrade requests).
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}
