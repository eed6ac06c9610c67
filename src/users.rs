//! User management
//!
//! CRUD over user records for the profile and admin surfaces. Registration
//! and login live in the auth module; this service covers everything after
//! that.

use std::sync::Arc;
use thiserror::Error;

use crate::auth::hash_password;
use crate::models::{Role, User};
use crate::store::{IdentityStore, NewUser, StoreError};

/// Default password for admin-created accounts that arrive without one.
const DEFAULT_PASSWORD: &str = "password123";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(i64),

    #[error("user not found: {0}")]
    NotFoundByName(String),

    #[error("username already exists")]
    UsernameTaken,

    #[error("email already exists")]
    EmailTaken,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admin-side create payload
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Profile update payload
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub struct UserService {
    identity: Arc<dyn IdentityStore>,
}

impl UserService {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    pub async fn all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.identity.all().await?)
    }

    pub async fn by_id(&self, id: i64) -> Result<User, UserError> {
        self.identity
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    pub async fn by_username(&self, username: &str) -> Result<User, UserError> {
        self.identity
            .find_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFoundByName(username.to_string()))
    }

    /// Create a user on behalf of an administrator.
    pub async fn create(&self, req: CreateUser) -> Result<User, UserError> {
        if self.identity.exists_by_username(&req.username).await? {
            return Err(UserError::UsernameTaken);
        }
        if self.identity.exists_by_email(&req.email).await? {
            return Err(UserError::EmailTaken);
        }

        let password = req.password.as_deref().unwrap_or(DEFAULT_PASSWORD);
        let password_hash =
            hash_password(password).map_err(|e| UserError::Hashing(e.to_string()))?;

        let user = self
            .identity
            .insert(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                address: req.address,
                role: req.role.unwrap_or(Role::Customer),
                active: req.active.unwrap_or(true),
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: i64, req: UpdateUser) -> Result<User, UserError> {
        let mut user = self.by_id(id).await?;
        user.first_name = req.first_name;
        user.last_name = req.last_name;
        user.email = req.email;
        user.phone = req.phone;
        user.address = req.address;
        Ok(self.identity.update(user).await?)
    }

    pub async fn update_role(&self, id: i64, role: Role) -> Result<User, UserError> {
        let mut user = self.by_id(id).await?;
        user.role = role;
        tracing::info!(user_id = id, role = role.as_str(), "user role updated");
        Ok(self.identity.update(user).await?)
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<User, UserError> {
        let mut user = self.by_id(id).await?;
        user.active = active;
        Ok(self.identity.update(user).await?)
    }

    pub async fn deactivate(&self, id: i64) -> Result<(), UserError> {
        self.set_active(id, false).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), UserError> {
        if !self.identity.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdentityStore;

    fn create_req(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: None,
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            phone: None,
            address: None,
            role: None,
            active: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_duplicates() {
        let service = UserService::new(Arc::new(MemoryIdentityStore::new()));
        let user = service.create(create_req("alice")).await.unwrap();
        assert_eq!(user.role, Role::Customer);
        assert!(user.active);
        assert!(!user.password_hash.is_empty());

        let err = service.create(create_req("alice")).await.unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));

        let mut req = create_req("alice2");
        req.email = "alice@example.com".to_string();
        let err = service.create(req).await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn test_role_update_and_deactivate() {
        let service = UserService::new(Arc::new(MemoryIdentityStore::new()));
        let user = service.create(create_req("bob")).await.unwrap();

        let user = service.update_role(user.id, Role::Provider).await.unwrap();
        assert_eq!(user.role, Role::Provider);

        service.deactivate(user.id).await.unwrap();
        assert!(!service.by_id(user.id).await.unwrap().active);

        service.delete(user.id).await.unwrap();
        assert!(matches!(
            service.by_id(user.id).await.unwrap_err(),
            UserError::NotFound(_)
        ));
    }
}
