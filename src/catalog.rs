//! Catalog - categories and service offerings
//!
//! Customer-facing listings only show active services; admin listings show
//! everything. Deleting a service through this service is a soft delete
//! (active flag), keeping historical orders pointed at a real record; the
//! admin surface has the hard delete.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Category, ServiceOffering};
use crate::reviews::{rating_stats, RatingStats};
use crate::store::{
    CatalogStore, IdentityStore, NewCategory, NewService, ReviewStore, StoreError,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("category not found: {0}")]
    CategoryNotFound(i64),

    #[error("service not found: {0}")]
    ServiceNotFound(i64),

    #[error("provider not found: {0}")]
    ProviderNotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Category projection with its active-service count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub service_count: u64,
}

/// Service projection with names and review stats resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    pub active: bool,
    pub average_rating: f64,
    pub review_count: usize,
}

/// Category create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Service create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub provider_id: Option<i64>,
    pub active: Option<bool>,
}

pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    identity: Arc<dyn IdentityStore>,
    reviews: Arc<dyn ReviewStore>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        identity: Arc<dyn IdentityStore>,
        reviews: Arc<dyn ReviewStore>,
    ) -> Self {
        Self {
            catalog,
            identity,
            reviews,
        }
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn categories(&self) -> Result<Vec<CategoryView>, CatalogError> {
        let categories = self.catalog.all_categories().await?;
        let mut views = Vec::with_capacity(categories.len());
        for category in categories {
            views.push(self.project_category(category).await?);
        }
        Ok(views)
    }

    pub async fn category(&self, id: i64) -> Result<CategoryView, CatalogError> {
        let category = self
            .catalog
            .find_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;
        self.project_category(category).await
    }

    pub async fn create_category(&self, input: CategoryInput) -> Result<CategoryView, CatalogError> {
        let category = self
            .catalog
            .insert_category(NewCategory {
                name: input.name,
                description: input.description,
                icon: input.icon,
            })
            .await?;
        self.project_category(category).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: CategoryInput,
    ) -> Result<CategoryView, CatalogError> {
        let mut category = self
            .catalog
            .find_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;
        category.name = input.name;
        category.description = input.description;
        category.icon = input.icon;
        let category = self.catalog.update_category(category).await?;
        self.project_category(category).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), CatalogError> {
        if !self.catalog.delete_category(id).await? {
            return Err(CatalogError::CategoryNotFound(id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Active services only (customer listings).
    pub async fn services(&self) -> Result<Vec<ServiceView>, CatalogError> {
        let services = self.catalog.active_services().await?;
        self.project_services(services).await
    }

    /// Every service, inactive included (admin listings).
    pub async fn all_services(&self) -> Result<Vec<ServiceView>, CatalogError> {
        let services = self.catalog.all_services().await?;
        self.project_services(services).await
    }

    pub async fn service(&self, id: i64) -> Result<ServiceView, CatalogError> {
        let service = self
            .catalog
            .find_service(id)
            .await?
            .ok_or(CatalogError::ServiceNotFound(id))?;
        self.project_service(service).await
    }

    pub async fn services_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<ServiceView>, CatalogError> {
        let services = self.catalog.services_by_category(category_id).await?;
        self.project_services(services).await
    }

    pub async fn services_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<ServiceView>, CatalogError> {
        let services = self.catalog.services_by_provider(provider_id).await?;
        self.project_services(services).await
    }

    pub async fn create_service(&self, input: ServiceInput) -> Result<ServiceView, CatalogError> {
        self.catalog
            .find_category(input.category_id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(input.category_id))?;

        if let Some(provider_id) = input.provider_id {
            self.identity
                .find_by_id(provider_id)
                .await?
                .ok_or(CatalogError::ProviderNotFound(provider_id))?;
        }

        let service = self
            .catalog
            .insert_service(NewService {
                name: input.name,
                description: input.description,
                price: input.price,
                duration_minutes: input.duration_minutes,
                image_url: input.image_url,
                category_id: input.category_id,
                provider_id: input.provider_id,
                active: input.active.unwrap_or(true),
            })
            .await?;

        tracing::info!(service_id = service.id, name = %service.name, "service created");
        self.project_service(service).await
    }

    pub async fn update_service(
        &self,
        id: i64,
        input: ServiceInput,
    ) -> Result<ServiceView, CatalogError> {
        let mut service = self
            .catalog
            .find_service(id)
            .await?
            .ok_or(CatalogError::ServiceNotFound(id))?;

        self.catalog
            .find_category(input.category_id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(input.category_id))?;

        service.name = input.name;
        service.description = input.description;
        service.price = input.price;
        service.duration_minutes = input.duration_minutes;
        service.image_url = input.image_url;
        service.category_id = input.category_id;

        let service = self.catalog.update_service(service).await?;
        self.project_service(service).await
    }

    /// Soft delete: flips the active flag, the record stays.
    pub async fn deactivate_service(&self, id: i64) -> Result<(), CatalogError> {
        let mut service = self
            .catalog
            .find_service(id)
            .await?
            .ok_or(CatalogError::ServiceNotFound(id))?;
        service.active = false;
        self.catalog.update_service(service).await?;
        tracing::info!(service_id = id, "service deactivated");
        Ok(())
    }

    pub async fn set_service_active(&self, id: i64, active: bool) -> Result<ServiceView, CatalogError> {
        let mut service = self
            .catalog
            .find_service(id)
            .await?
            .ok_or(CatalogError::ServiceNotFound(id))?;
        service.active = active;
        let service = self.catalog.update_service(service).await?;
        self.project_service(service).await
    }

    /// Hard delete, admin only.
    pub async fn delete_service(&self, id: i64) -> Result<(), CatalogError> {
        if !self.catalog.delete_service(id).await? {
            return Err(CatalogError::ServiceNotFound(id));
        }
        tracing::info!(service_id = id, "service deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    async fn project_category(&self, category: Category) -> Result<CategoryView, CatalogError> {
        let service_count = self.catalog.services_by_category(category.id).await?.len() as u64;
        Ok(CategoryView {
            id: category.id,
            name: category.name,
            description: category.description,
            icon: category.icon,
            service_count,
        })
    }

    async fn project_services(
        &self,
        services: Vec<ServiceOffering>,
    ) -> Result<Vec<ServiceView>, CatalogError> {
        let mut views = Vec::with_capacity(services.len());
        for service in services {
            views.push(self.project_service(service).await?);
        }
        Ok(views)
    }

    async fn project_service(&self, service: ServiceOffering) -> Result<ServiceView, CatalogError> {
        let category_name = self
            .catalog
            .find_category(service.category_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();

        let provider = match service.provider_id {
            Some(id) => self.identity.find_by_id(id).await?,
            None => None,
        };

        let RatingStats {
            average_rating,
            review_count,
        } = rating_stats(&self.reviews.by_service(service.id).await?);

        Ok(ServiceView {
            id: service.id,
            name: service.name,
            description: service.description,
            price: service.price,
            duration_minutes: service.duration_minutes,
            image_url: service.image_url,
            category_id: service.category_id,
            category_name,
            provider_id: service.provider_id,
            provider_name: provider.map(|p| p.full_name()),
            active: service.active,
            average_rating,
            review_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::{MemoryCatalogStore, MemoryIdentityStore, MemoryReviewStore, NewUser};

    fn catalog_service() -> (CatalogService, Arc<MemoryIdentityStore>) {
        let identity = Arc::new(MemoryIdentityStore::new());
        let service = CatalogService::new(
            Arc::new(MemoryCatalogStore::new()),
            identity.clone(),
            Arc::new(MemoryReviewStore::new()),
        );
        (service, identity)
    }

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: None,
            icon: None,
        }
    }

    fn service_input(name: &str, category_id: i64, provider_id: Option<i64>) -> ServiceInput {
        ServiceInput {
            name: name.to_string(),
            description: None,
            price: Some(Decimal::new(4999, 2)),
            duration_minutes: Some(90),
            image_url: None,
            category_id,
            provider_id,
            active: None,
        }
    }

    #[tokio::test]
    async fn test_create_service_checks_references() {
        let (catalog, identity) = catalog_service();

        let err = catalog
            .create_service(service_input("Svc", 99, None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(99)));

        let cat = catalog.create_category(category_input("Cleaning")).await.unwrap();
        let err = catalog
            .create_service(service_input("Svc", cat.id, Some(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProviderNotFound(7)));

        let provider = identity
            .insert(NewUser {
                username: "p1".to_string(),
                email: "p1@example.com".to_string(),
                password_hash: "h".to_string(),
                first_name: "Pat".to_string(),
                last_name: "Lee".to_string(),
                phone: None,
                address: None,
                role: Role::Provider,
                active: true,
            })
            .await
            .unwrap();

        let view = catalog
            .create_service(service_input("Svc", cat.id, Some(provider.id)))
            .await
            .unwrap();
        assert_eq!(view.category_name, "Cleaning");
        assert_eq!(view.provider_name.as_deref(), Some("Pat Lee"));
        assert!(view.active);
        assert_eq!(view.review_count, 0);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_listing() {
        let (catalog, _) = catalog_service();
        let cat = catalog.create_category(category_input("Garden")).await.unwrap();
        let svc = catalog
            .create_service(service_input("Mow", cat.id, None))
            .await
            .unwrap();

        assert_eq!(catalog.services().await.unwrap().len(), 1);
        catalog.deactivate_service(svc.id).await.unwrap();

        assert!(catalog.services().await.unwrap().is_empty());
        assert_eq!(catalog.all_services().await.unwrap().len(), 1);
        // Still fetchable by id and counted out of category listings.
        assert!(!catalog.service(svc.id).await.unwrap().active);
        assert_eq!(catalog.category(cat.id).await.unwrap().service_count, 0);
    }
}
