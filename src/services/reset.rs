//! Password reset by emailed single-use token.
//!
//! A token is 32 random alphanumeric characters stored in the [`TokenStore`] as
//! `password_reset:{token} -> email` with a fixed TTL. Redeeming it replaces the
//! password hash and deletes the entry, so at most one redemption succeeds.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::auth::password;
use crate::email::{Mailer, templates};
use crate::error::AppError;
use crate::repository::UserRepository;
use crate::store::TokenStore;

pub const TOKEN_LENGTH: usize = 32;
const KEY_PREFIX: &str = "password_reset:";

#[derive(Debug, Clone)]
pub struct ResetSettings {
    pub ttl: Duration,
    /// Base URL of the frontend; the link is `{frontend_url}/reset-password?token=...`.
    pub frontend_url: String,
}

pub struct ResetTokenService {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn TokenStore>,
    mailer: Arc<dyn Mailer>,
    settings: ResetSettings,
}

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn store_key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl ResetTokenService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn TokenStore>,
        mailer: Arc<dyn Mailer>,
        settings: ResetSettings,
    ) -> Self {
        Self {
            users,
            store,
            mailer,
            settings,
        }
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.settings.frontend_url)
    }

    fn timeout_minutes(&self) -> u64 {
        (self.settings.ttl.as_secs() / 60).max(1)
    }

    /// Issue a token and email the link. Unknown addresses are a silent no-op so
    /// the caller's response never reveals whether an account exists.
    ///
    /// A mail failure is logged and leaves the stored token in place.
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_token();
        self.store
            .put(&store_key(&token), &user.email, self.settings.ttl)
            .await?;

        let reset_url = self.reset_url(&token);
        let message = templates::password_reset(
            &user.email,
            &user.full_name,
            &reset_url,
            self.timeout_minutes(),
        )
        .map_err(AppError::Internal)?;

        match self.mailer.send(&message).await {
            Ok(()) => tracing::info!(user_id = %user.id, "Password reset email sent"),
            Err(e) => {
                tracing::error!(user_id = %user.id, "Failed to send password reset email: {e}")
            }
        }

        Ok(())
    }

    /// Consume `token` and set the account's password to `new_password`.
    pub async fn redeem_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if !is_well_formed(token) {
            return Err(AppError::InvalidOrExpiredToken);
        }

        let key = store_key(token);
        let email = self
            .store
            .get(&key)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;
        self.users.update_password(user.id, &pw_hash).await?;

        // The password is already changed; a stale entry expires with its TTL.
        if let Err(e) = self.store.delete(&key).await {
            tracing::warn!(user_id = %user.id, "Failed to invalidate reset token: {e}");
        }

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
