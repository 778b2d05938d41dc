//! Persistence seams used by the services.
//!
//! Production wiring uses the PostgreSQL implementations in [`crate::db`];
//! tests substitute in-memory ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::validation::ProfileChanges;

#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with a validation error on `email` when the address is taken.
    async fn create(&self, new_user: NewUser<'_>) -> Result<User, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<User, AppError>;

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<User, AppError>;
}

/// Revoked refresh tokens, keyed by their `jti` claim.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Returns `false` if the token was already blacklisted.
    async fn add(&self, jti: Uuid, user_id: Uuid, expires_at: DateTime<Utc>)
    -> Result<bool, AppError>;

    async fn contains(&self, jti: Uuid) -> Result<bool, AppError>;

    /// Drop entries whose token has expired anyway. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}
