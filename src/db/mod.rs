//! PostgreSQL-backed implementations of the persistence traits.

pub mod blacklisted_tokens;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::repository::{NewUser, TokenBlacklist, UserRepository};
use crate::validation::{EMAIL_TAKEN, ProfileChanges};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Maps a duplicate-email insert or update to the same field error the
/// up-front check produces, so concurrent registrations fail cleanly.
fn email_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::field("email", EMAIL_TAKEN)
    } else {
        AppError::Database(err)
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(users::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, new_user: NewUser<'_>) -> Result<User, AppError> {
        users::create(
            &self.pool,
            new_user.email,
            new_user.password_hash,
            new_user.full_name,
        )
        .await
        .map_err(email_conflict)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        Ok(users::update_password(&self.pool, id, password_hash).await?)
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<User, AppError> {
        Ok(users::record_login(&self.pool, id, at, ip).await?)
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<User, AppError> {
        users::update_profile(
            &self.pool,
            id,
            changes.email.as_deref(),
            changes.full_name.as_deref(),
        )
        .await
        .map_err(email_conflict)
    }
}

#[derive(Clone)]
pub struct PgTokenBlacklist {
    pool: PgPool,
}

impl PgTokenBlacklist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenBlacklist for PgTokenBlacklist {
    async fn add(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(blacklisted_tokens::insert(&self.pool, jti, user_id, expires_at).await?)
    }

    async fn contains(&self, jti: Uuid) -> Result<bool, AppError> {
        Ok(blacklisted_tokens::exists(&self.pool, jti).await?)
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        Ok(blacklisted_tokens::purge_expired(&self.pool).await?)
    }
}
