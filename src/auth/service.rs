//! Registration, login and token handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Role, User};
use crate::store::{IdentityStore, NewUser, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already exists")]
    UsernameTaken,

    #[error("email already exists")]
    EmailTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token encoding failed: {0}")]
    TokenEncoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// JWT claims: subject is the user id, role rides along for gating.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    #[schema(example = "user1")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "user1@example.com")]
    pub email: String,
    #[validate(length(min = 6))]
    #[schema(example = "password123")]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user1")]
    pub username: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Auth response carrying the issued JWT
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored argon2 PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub struct AuthService {
    identity: Arc<dyn IdentityStore>,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityStore>, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            identity,
            jwt_secret,
            token_ttl_hours,
        }
    }

    /// Register a new customer account and issue a token.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AuthError> {
        if self.identity.exists_by_username(&req.username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.identity.exists_by_email(&req.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&req.password)?;
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
                role: Role::Customer,
                active: true,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        self.respond(user)
    }

    /// Verify credentials and issue a token.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .identity
            .find_by_username(&req.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&req.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        tracing::info!(user_id = user.id, "login succeeded");
        self.respond(user)
    }

    /// Issue a JWT for a user.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_ttl_hours);
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Decode and validate a JWT.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }

    fn respond(&self, user: User) -> Result<AuthResponse, AuthError> {
        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdentityStore;

    fn register_req(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "hunter22".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            phone: None,
            address: None,
        }
    }

    fn auth_service() -> (AuthService, Arc<MemoryIdentityStore>) {
        let identity = Arc::new(MemoryIdentityStore::new());
        (
            AuthService::new(identity.clone(), "test-secret".to_string(), 24),
            identity,
        )
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = auth_service();
        let registered = auth.register(register_req("alice")).await.unwrap();
        assert_eq!(registered.role, Role::Customer);

        let logged_in = auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user_id, registered.user_id);

        let claims = auth.verify_token(&logged_in.token).unwrap();
        assert_eq!(claims.sub, registered.user_id.to_string());
        assert_eq!(claims.role, "CUSTOMER");
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (auth, identity) = auth_service();
        auth.register(register_req("bob")).await.unwrap();

        let err = auth
            .login(LoginRequest {
                username: "bob".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth
            .login(LoginRequest {
                username: "nobody".to_string(),
                password: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Deactivated accounts are rejected even with the right password.
        let mut user = identity.find_by_username("bob").await.unwrap().unwrap();
        user.active = false;
        identity.update(user).await.unwrap();
        let err = auth
            .login(LoginRequest {
                username: "bob".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (auth, _) = auth_service();
        auth.register(register_req("carol")).await.unwrap();

        let err = auth.register(register_req("carol")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));

        let mut req = register_req("carol2");
        req.email = "carol@example.com".to_string();
        let err = auth.register(req).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_bad_token_rejected() {
        let (auth, _) = auth_service();
        assert!(matches!(
            auth.verify_token("garbage").unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
