use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::auth::jwt::{TokenIssuer, TokenPair, TokenType};
use crate::auth::password;
use crate::error::AppError;
use crate::models::User;
use crate::repository::{NewUser, TokenBlacklist, UserRepository};
use crate::validation::{
    EMAIL_TAKEN, FieldErrors, Login, PasswordChange, ProfileChanges, Registration,
};

const INVALID_TOKEN: &str = "Invalid token";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// A user together with a freshly issued token pair.
#[derive(Debug, Serialize)]
pub struct AuthOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
    tokens: TokenIssuer,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        blacklist: Arc<dyn TokenBlacklist>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            users,
            blacklist,
            tokens,
        }
    }

    fn outcome(&self, user: User) -> Result<AuthOutcome, AppError> {
        let tokens = self.tokens.issue_pair(user.id).map_err(AppError::Internal)?;
        Ok(AuthOutcome { user, tokens })
    }

    pub async fn register(&self, registration: Registration) -> Result<AuthOutcome, AppError> {
        if registration.password != registration.password_confirm {
            return Err(AppError::field("password_confirm", "Passwords don't match."));
        }

        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }

        let pw_hash = password::hash(&registration.password).map_err(AppError::Internal)?;
        let user = self
            .users
            .create(NewUser {
                email: &registration.email,
                password_hash: &pw_hash,
                full_name: &registration.full_name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.outcome(user)
    }

    /// Unknown email, wrong password and disabled account all fail the same way.
    pub async fn login(&self, login: &Login, client_ip: Option<&str>) -> Result<AuthOutcome, AppError> {
        let user = self
            .users
            .find_by_email(&login.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = password::verify(&login.password, &user.password_hash)
            .map_err(AppError::Internal)?;

        if !valid || !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let user = self.users.record_login(user.id, Utc::now(), client_ip).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.outcome(user)
    }

    /// Blacklist a refresh token. Malformed, expired and already revoked tokens
    /// are all reported as [`AppError::InvalidToken`].
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|_| AppError::InvalidToken(INVALID_TOKEN.to_string()))?;

        let expires_at = claims
            .expires_at()
            .ok_or_else(|| AppError::InvalidToken(INVALID_TOKEN.to_string()))?;

        if !self.blacklist.add(claims.jti, claims.sub, expires_at).await? {
            return Err(AppError::InvalidToken(INVALID_TOKEN.to_string()));
        }

        tracing::info!(user_id = %claims.sub, "Refresh token blacklisted");
        Ok(())
    }

    /// Mint a new access token for the subject of a valid refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let invalid = || AppError::InvalidToken(INVALID_REFRESH_TOKEN.to_string());

        let claims = self
            .tokens
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|_| invalid())?;

        if self.blacklist.contains(claims.jti).await? {
            return Err(invalid());
        }

        match self.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active => {}
            _ => return Err(invalid()),
        }

        self.tokens.issue_access(claims.sub).map_err(AppError::Internal)
    }

    /// Resolve a bearer access token to an active user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AppError> {
        let claims = self
            .tokens
            .verify(access_token, TokenType::Access)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized("User is inactive".to_string()));
        }

        Ok(user)
    }

    pub async fn change_password(&self, user: &User, change: &PasswordChange) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();

        let current_ok = password::verify(&change.current_password, &user.password_hash)
            .map_err(AppError::Internal)?;
        if !current_ok {
            errors.add("current_password", "Current password is incorrect.");
        }
        if change.new_password != change.new_password_confirm {
            errors.add("new_password_confirm", "New passwords don't match.");
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let pw_hash = password::hash(&change.new_password).map_err(AppError::Internal)?;
        self.users.update_password(user.id, &pw_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    pub async fn update_profile(&self, user: &User, changes: &ProfileChanges) -> Result<User, AppError> {
        if let Some(email) = changes.email.as_deref().filter(|e| *e != user.email) {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(AppError::field("email", EMAIL_TAKEN));
            }
        }

        let updated = self.users.update_profile(user.id, changes).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(updated)
    }
}
