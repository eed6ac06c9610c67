//! Review endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::gateway::response::{ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::gateway::types::{CreateReviewRequest, UpdateReviewRequest};
use crate::reviews::{RatingStats, ReviewInput, ReviewView};

/// GET /api/reviews
pub async fn get_all_reviews(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ReviewView>> {
    let reviews = state.reviews.all().await?;
    ok(reviews)
}

/// GET /api/reviews/{id}
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ReviewView> {
    let review = state.reviews.by_id(id).await?;
    ok(review)
}

/// GET /api/reviews/provider/{providerId}
pub async fn get_reviews_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<i64>,
) -> ApiResult<Vec<ReviewView>> {
    let reviews = state.reviews.by_provider(provider_id).await?;
    ok(reviews)
}

/// GET /api/reviews/service/{serviceId}
pub async fn get_reviews_by_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<i64>,
) -> ApiResult<Vec<ReviewView>> {
    let reviews = state.reviews.by_service(service_id).await?;
    ok(reviews)
}

/// GET /api/reviews/service/{serviceId}/stats
pub async fn get_service_rating(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<i64>,
) -> ApiResult<RatingStats> {
    let stats = state.reviews.stats_for_service(service_id).await?;
    ok(stats)
}

/// POST /api/reviews - review one of your completed orders
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<ReviewView> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let review = state
        .reviews
        .create(
            user.user_id,
            ReviewInput {
                order_id: req.order_id,
                rating: req.rating,
                comment: req.comment,
            },
        )
        .await?;
    ok(review)
}

/// PUT /api/reviews/{id}
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateReviewRequest>,
) -> ApiResult<ReviewView> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let review = state.reviews.update(id, req.rating, req.comment).await?;
    ok(review)
}

/// DELETE /api/reviews/{id} (administrators)
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require_admin()?;
    state.reviews.delete(id).await?;
    ok(())
}
