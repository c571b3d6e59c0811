use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Role, User};
use crate::repository::UserStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Outcome of `initialize_default_users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialization {
    Created,
    AlreadyPresent,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: &str, expiration_hours: i64) -> Self {
        Self {
            users,
            jwt_secret: jwt_secret.to_string(),
            expiration_hours,
        }
    }

    pub fn issue_token(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.expiration_hours)
            .filter(|lifetime| *lifetime > Duration::zero())
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                anyhow::anyhow!("Token lifetime of {} hours is out of range", self.expiration_hours)
            })?;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow::anyhow!("JWT encoding failed: {}", e))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AuthError::InvalidToken
        })?;
        Ok(data.claims)
    }

    /// Checks credentials, records the login and returns the user with a fresh token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let mut user = match self.users.find_by_username(username).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::info!(username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash) {
            tracing::info!(username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        user.last_login_at = Some(Utc::now());
        self.users.save(&user).await?;

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, username, "Login successful");
        Ok((user, token))
    }

    pub async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    /// Creates `manager` and `admin` when the user store is empty.
    pub async fn initialize_default_users(&self) -> anyhow::Result<Initialization> {
        if self.users.count().await? > 0 {
            return Ok(Initialization::AlreadyPresent);
        }

        let defaults = [
            ("manager", "manager@routewise.local", "manager123", Role::Manager),
            ("admin", "admin@routewise.local", "admin123", Role::Admin),
        ];
        for (username, email, password, role) in defaults {
            let user = User::new(username, email, hash_password(password)?, vec![role]);
            self.users.save(&user).await?;
        }

        tracing::info!("Default users created");
        Ok(Initialization::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryUserStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryUserStore::default()), "test-secret", 1)
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("manager123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("manager123", &hash));
        assert!(!verify_password("manager124", &hash));
        assert!(!verify_password("manager123", "not-a-hash"));
    }

    #[test]
    fn test_token_carries_identity() {
        let auth = service();
        let user = User::new("admin", "admin@example.com", String::new(), vec![Role::Admin]);
        let token = auth.issue_token(&user).unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.roles, vec![Role::Admin]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let user = User::new("admin", "admin@example.com", String::new(), vec![Role::Admin]);
        let other = AuthService::new(Arc::new(MemoryUserStore::default()), "other-secret", 1);
        let token = other.issue_token(&user).unwrap();

        assert!(matches!(service().verify_token(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(service().verify_token("garbage"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_initialize_then_authenticate() {
        let auth = service();
        tokio_test::block_on(async {
            assert_eq!(auth.initialize_default_users().await.unwrap(), Initialization::Created);
            assert_eq!(auth.initialize_default_users().await.unwrap(), Initialization::AlreadyPresent);

            let (user, token) = auth.authenticate("manager", "manager123").await.unwrap();
            assert_eq!(user.roles, vec![Role::Manager]);
            assert!(user.last_login_at.is_some());
            assert!(!token.is_empty());

            assert!(matches!(
                auth.authenticate("manager", "wrong").await,
                Err(AuthError::InvalidCredentials)
            ));
            assert!(matches!(
                auth.authenticate("nobody", "manager123").await,
                Err(AuthError::InvalidCredentials)
            ));
        });
    }

    #[test]
    fn test_unrepresentable_lifetime_is_error() {
        let user = User::new("admin", "admin@example.com", String::new(), vec![Role::Admin]);
        for hours in [0, -5, 100_000_000_000, i64::MAX] {
            let auth = AuthService::new(Arc::new(MemoryUserStore::default()), "test-secret", hours);
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| auth.issue_token(&user)));
            assert!(result.is_ok(), "issue_token must not panic for {} hours", hours);
            assert!(result.unwrap().is_err(), "A lifetime of {} hours must be rejected", hours);
        }
    }
}
