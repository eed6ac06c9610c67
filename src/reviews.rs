//! Reviews against completed orders
//!
//! A review is one-to-one with a COMPLETED order and must come from the
//! order's own customer. Rating stats feed the catalog's service views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{OrderStatus, Review};
use crate::store::{CatalogStore, IdentityStore, NewReview, OrderStore, ReviewStore, StoreError};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("review not found: {0}")]
    NotFound(i64),

    #[error("order not found: {0}")]
    OrderNotFound(i64),

    #[error("customers can only review their own orders")]
    NotYourOrder,

    #[error("only completed orders can be reviewed")]
    OrderNotCompleted,

    #[error("review already exists for order {0}")]
    AlreadyReviewed(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub order_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Review projection with names resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewView {
    pub id: i64,
    pub order_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    pub service_id: i64,
    pub service_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating for one service
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingStats {
    pub average_rating: f64,
    pub review_count: usize,
}

/// Average rating over a review set; 0.0 for an empty set.
pub fn rating_stats(reviews: &[Review]) -> RatingStats {
    if reviews.is_empty() {
        return RatingStats {
            average_rating: 0.0,
            review_count: 0,
        };
    }
    let sum: i32 = reviews.iter().map(|r| r.rating).sum();
    RatingStats {
        average_rating: f64::from(sum) / reviews.len() as f64,
        review_count: reviews.len(),
    }
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    orders: Arc<dyn OrderStore>,
    identity: Arc<dyn IdentityStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        orders: Arc<dyn OrderStore>,
        identity: Arc<dyn IdentityStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            reviews,
            orders,
            identity,
            catalog,
        }
    }

    pub async fn all(&self) -> Result<Vec<ReviewView>, ReviewError> {
        let reviews = self.reviews.all().await?;
        self.project_many(reviews).await
    }

    pub async fn by_id(&self, id: i64) -> Result<ReviewView, ReviewError> {
        let review = self
            .reviews
            .find(id)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        self.project(review).await
    }

    pub async fn by_provider(&self, provider_id: i64) -> Result<Vec<ReviewView>, ReviewError> {
        let reviews = self.reviews.by_provider(provider_id).await?;
        self.project_many(reviews).await
    }

    pub async fn by_service(&self, service_id: i64) -> Result<Vec<ReviewView>, ReviewError> {
        let reviews = self.reviews.by_service(service_id).await?;
        self.project_many(reviews).await
    }

    pub async fn stats_for_service(&self, service_id: i64) -> Result<RatingStats, ReviewError> {
        let reviews = self.reviews.by_service(service_id).await?;
        Ok(rating_stats(&reviews))
    }

    /// Create a review for one of the customer's completed orders.
    pub async fn create(
        &self,
        customer_id: i64,
        input: ReviewInput,
    ) -> Result<ReviewView, ReviewError> {
        let order = self
            .orders
            .find(input.order_id)
            .await?
            .ok_or(ReviewError::OrderNotFound(input.order_id))?;

        if order.customer_id != customer_id {
            return Err(ReviewError::NotYourOrder);
        }
        if order.status != OrderStatus::Completed {
            return Err(ReviewError::OrderNotCompleted);
        }
        if self.reviews.by_order(order.id).await?.is_some() {
            return Err(ReviewError::AlreadyReviewed(order.id));
        }

        let review = self
            .reviews
            .insert(NewReview {
                order_id: order.id,
                customer_id: order.customer_id,
                provider_id: order.provider_id,
                service_id: order.service_id,
                rating: input.rating,
                comment: input.comment,
            })
            .await?;

        tracing::info!(review_id = review.id, order_id = order.id, "review created");
        self.project(review).await
    }

    pub async fn update(
        &self,
        id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<ReviewView, ReviewError> {
        let mut review = self
            .reviews
            .find(id)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        review.rating = rating;
        review.comment = comment;
        let review = self.reviews.update(review).await?;
        self.project(review).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ReviewError> {
        if !self.reviews.delete(id).await? {
            return Err(ReviewError::NotFound(id));
        }
        Ok(())
    }

    async fn project_many(&self, reviews: Vec<Review>) -> Result<Vec<ReviewView>, ReviewError> {
        let mut views = Vec::with_capacity(reviews.len());
        for review in reviews {
            views.push(self.project(review).await?);
        }
        Ok(views)
    }

    async fn project(&self, review: Review) -> Result<ReviewView, ReviewError> {
        let provider = match review.provider_id {
            Some(id) => self.identity.find_by_id(id).await?,
            None => None,
        };
        let service_name = self
            .catalog
            .find_service(review.service_id)
            .await?
            .map(|s| s.name)
            .unwrap_or_default();

        Ok(ReviewView {
            id: review.id,
            order_id: review.order_id,
            provider_id: review.provider_id,
            provider_name: provider.map(|p| p.full_name()),
            service_id: review.service_id,
            service_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        })
    }
}
